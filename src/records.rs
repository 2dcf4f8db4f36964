//! Managed router records: how they are read, added and removed.
//!
//! A record is managed when its tag field (DNS comment or address-list name)
//! equals the configured tag. Nothing else is ever read or removed.

use std::collections::BTreeMap;
use std::net::IpAddr;
use tracing::{debug, info, warn};

use crate::config::{Config, Target};
use crate::error::{AdisheError, Result};
use crate::routeros::{Request, RouterApi};
use crate::utils::format_count;

/// Router-assigned record identifier (`*1A`)
pub type RecordId = String;

/// Managed records currently on the router, hostname to identifier
pub type RouterRecords = BTreeMap<String, RecordId>;

/// Shape of the records this tool owns on the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedSet {
    pub target: Target,
    pub tag: String,
    pub sink: IpAddr,
}

impl ManagedSet {
    pub fn new(target: Target, tag: impl Into<String>, sink: IpAddr) -> Self {
        Self {
            target,
            tag: tag.into(),
            sink,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.target, config.tag.clone(), config.sink_address)
    }

    /// Filtered listing of managed records, projected to the needed fields
    pub fn print_request(&self) -> Request {
        Request::new(format!("{}/print", self.target.menu()))
            .query(self.target.tag_field(), &self.tag)
            .proplist(&[".id", self.target.key_field(), self.target.tag_field(), "dynamic"])
    }

    /// One batched removal by identifier list
    pub fn remove_request<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Request {
        let ids: Vec<&str> = ids.into_iter().collect();
        Request::new(format!("{}/remove", self.target.menu())).attr("numbers", ids.join(","))
    }

    /// Live add of one hostname
    pub fn add_request(&self, host: &str) -> Request {
        let request = Request::new(format!("{}/add", self.target.menu()));
        match self.target {
            Target::DnsStatic => request
                .attr("name", host)
                .attr("address", self.sink.to_string())
                .attr("comment", &self.tag),
            Target::AddressList => request.attr("list", &self.tag).attr("address", host),
        }
    }

    /// Import-script line adding one hostname
    pub fn script_line(&self, host: &str) -> String {
        match self.target {
            Target::DnsStatic => format!(
                "add address={} name={} comment={}",
                self.sink, host, self.tag
            ),
            Target::AddressList => format!("add list={} address={}", self.tag, host),
        }
    }

    /// Read the managed records from the router.
    ///
    /// Rows whose tag is missing or does not match are dropped even if the
    /// router ignored the query filter. Dynamic rows (address-list entries
    /// the router creates when resolving a hostname) are never treated as
    /// managed.
    pub async fn read(&self, api: &dyn RouterApi) -> Result<RouterRecords> {
        info!("Retrieving managed {} entries from router...", self.target);

        let rows = api
            .execute(&self.print_request())
            .await
            .map_err(AdisheError::Query)?;

        let key_field = self.target.key_field();
        let tag_field = self.target.tag_field();
        let mut records = RouterRecords::new();

        for row in rows {
            // RouterOS omits empty properties, so a missing tag is untagged too
            if row.get(tag_field).map(String::as_str) != Some(self.tag.as_str()) {
                debug!("Ignoring untagged row {:?}", row.get(".id"));
                continue;
            }
            if row.get("dynamic").is_some_and(|d| d == "true") {
                continue;
            }
            match (row.get(key_field), row.get(".id")) {
                (Some(host), Some(id)) => {
                    if let Some(previous) = records.insert(host.clone(), id.clone()) {
                        warn!("Duplicate managed entry for {} ({} and {})", host, previous, id);
                    }
                }
                _ => warn!("Skipping managed row without {} or .id", key_field),
            }
        }

        info!(
            "Retrieved {} managed {} entries",
            format_count(records.len()),
            self.target
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routeros::mock::{row, MockRouter};

    fn dns_set() -> ManagedSet {
        ManagedSet::new(Target::DnsStatic, "adishe", IpAddr::from([127, 0, 0, 1]))
    }

    fn list_set() -> ManagedSet {
        ManagedSet::new(Target::AddressList, "adishe", IpAddr::from([127, 0, 0, 1]))
    }

    #[test]
    fn test_print_request_filters_by_tag() {
        let request = dns_set().print_request();
        assert_eq!(request.command(), "/ip/dns/static/print");
        assert_eq!(request.query_value("comment"), Some("adishe"));
        assert_eq!(request.attribute(".proplist"), Some(".id,name,comment,dynamic"));

        let request = list_set().print_request();
        assert_eq!(request.command(), "/ip/firewall/address-list/print");
        assert_eq!(request.query_value("list"), Some("adishe"));
    }

    #[test]
    fn test_remove_request_joins_ids() {
        let request = dns_set().remove_request(["*1", "*2", "*3"]);
        assert_eq!(request.command(), "/ip/dns/static/remove");
        assert_eq!(request.attribute("numbers"), Some("*1,*2,*3"));
    }

    #[test]
    fn test_add_request() {
        let request = dns_set().add_request("bad.example.com");
        assert_eq!(request.command(), "/ip/dns/static/add");
        assert_eq!(request.attribute("name"), Some("bad.example.com"));
        assert_eq!(request.attribute("address"), Some("127.0.0.1"));
        assert_eq!(request.attribute("comment"), Some("adishe"));

        let request = list_set().add_request("bad.example.com");
        assert_eq!(request.command(), "/ip/firewall/address-list/add");
        assert_eq!(request.attribute("list"), Some("adishe"));
        assert_eq!(request.attribute("address"), Some("bad.example.com"));
    }

    #[test]
    fn test_script_lines() {
        assert_eq!(
            dns_set().script_line("bad.example.com"),
            "add address=127.0.0.1 name=bad.example.com comment=adishe"
        );
        assert_eq!(
            list_set().script_line("bad.example.com"),
            "add list=adishe address=bad.example.com"
        );
    }

    #[tokio::test]
    async fn test_read_maps_hostname_to_id() {
        let router = MockRouter::new(vec![
            row(&[(".id", "*1"), ("name", "a.example"), ("comment", "adishe")]),
            row(&[(".id", "*2"), ("name", "b.example"), ("comment", "adishe")]),
        ]);
        let records = dns_set().read(&router).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.get("a.example").map(String::as_str), Some("*1"));
        assert_eq!(records.get("b.example").map(String::as_str), Some("*2"));
        assert!(router.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_read_never_returns_untagged_rows() {
        let router = MockRouter::new(vec![
            row(&[(".id", "*1"), ("name", "mine.example"), ("comment", "adishe")]),
            row(&[(".id", "*2"), ("name", "manual.example"), ("comment", "home nas")]),
            row(&[(".id", "*3"), ("name", "dynamic.example"), ("comment", "adishe"), ("dynamic", "true")]),
            row(&[("name", "no-id.example"), ("comment", "adishe")]),
            row(&[(".id", "*9"), ("name", "nas.home")]),
        ]);
        let records = dns_set().read(&router).await.unwrap();
        assert_eq!(records.keys().collect::<Vec<_>>(), vec!["mine.example"]);
    }

    #[tokio::test]
    async fn test_read_failure_is_query_error() {
        let router = MockRouter::new(Vec::new()).failing("/ip/dns/static/print");
        let err = dns_set().read(&router).await.unwrap_err();
        assert!(matches!(err, AdisheError::Query(_)));
    }
}
