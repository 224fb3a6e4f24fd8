// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Validates service names and host addresses while parsing.

use serde::Deserialize;

use super::ServerAddress;
use crate::types::ServiceName;

pub fn deserialize_service_name<'de, D>(deserializer: D) -> Result<ServiceName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ServiceName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_server_address<'de, D>(deserializer: D) -> Result<ServerAddress, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ServerAddress::parse(&s).map_err(serde::de::Error::custom)
}
