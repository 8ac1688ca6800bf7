//! IP address validation endpoint.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::domains::endpoints::{Endpoint, EndpointError, HandlerOutcome, required};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct IpParams {
    /// IPv4 or IPv6 address.
    pub ip: Option<String>,
}

pub struct IpValidator;

fn v6_is_unique_local(addr: &Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xfe00) == 0xfc00
}

fn v6_is_link_local(addr: &Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xffc0) == 0xfe80
}

fn v4_details(addr: &Ipv4Addr) -> Value {
    json!({
        "is_private": addr.is_private(),
        "is_loopback": addr.is_loopback(),
        "is_link_local": addr.is_link_local(),
        "is_multicast": addr.is_multicast(),
        "is_unspecified": addr.is_unspecified(),
        "version": 4,
    })
}

fn v6_details(addr: &Ipv6Addr) -> Value {
    json!({
        "is_private": v6_is_unique_local(addr),
        "is_loopback": addr.is_loopback(),
        "is_link_local": v6_is_link_local(addr),
        "is_multicast": addr.is_multicast(),
        "is_unspecified": addr.is_unspecified(),
        "version": 6,
    })
}

#[async_trait]
impl Endpoint for IpValidator {
    const CATEGORY: &'static str = "validator";
    const NAME: &'static str = "ip";
    const DESCRIPTION: &'static str = "Validate an IPv4 or IPv6 address and classify its range";
    type Params = IpParams;

    async fn execute(&self, params: IpParams) -> Result<HandlerOutcome, EndpointError> {
        let ip = required(params.ip.as_deref(), "IP parameter required")?.trim();

        let (kind, details) = match ip.parse::<IpAddr>() {
            Ok(IpAddr::V4(addr)) => ("IPv4", v4_details(&addr)),
            Ok(IpAddr::V6(addr)) => ("IPv6", v6_details(&addr)),
            Err(_) => ("Invalid", Value::Null),
        };

        Ok(HandlerOutcome::success(json!({
            "ip": ip,
            "valid": details != Value::Null,
            "type": kind,
            "details": details,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn check(ip: &str) -> serde_json::Map<String, Value> {
        let params = IpParams {
            ip: Some(ip.to_string()),
        };
        IpValidator.execute(params).await.unwrap().payload().clone()
    }

    #[tokio::test]
    async fn test_private_ipv4() {
        let payload = check("172.20.1.1").await;
        assert_eq!(payload["type"], "IPv4");
        assert_eq!(payload["details"]["is_private"], true);

        let public = check("8.8.8.8").await;
        assert_eq!(public["details"]["is_private"], false);
    }

    #[tokio::test]
    async fn test_ipv6() {
        let payload = check("fe80::1").await;
        assert_eq!(payload["type"], "IPv6");
        assert_eq!(payload["details"]["is_link_local"], true);
        assert_eq!(check("::1").await["details"]["is_loopback"], true);
    }

    #[tokio::test]
    async fn test_invalid() {
        let payload = check("999.1.1.1").await;
        assert_eq!(payload["valid"], false);
        assert_eq!(payload["type"], "Invalid");
    }
}
