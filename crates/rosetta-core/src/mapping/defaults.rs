use super::codec::FieldType;
use super::registry::{FieldMapping, FieldMappingRegistry};

const INTERFACE: &[(&str, &str, FieldType)] = &[
    ("name", "name", FieldType::String),
    ("type", "type", FieldType::String),
    ("enabled", "disabled", FieldType::Bool),
    ("running", "running", FieldType::Bool),
    ("macAddress", "mac-address", FieldType::Mac),
    ("mtu", "mtu", FieldType::Int),
    ("comment", "comment", FieldType::String),
    ("txBytes", "tx-byte", FieldType::Size),
    ("rxBytes", "rx-byte", FieldType::Size),
];

const ETHERNET: &[(&str, &str, FieldType)] = &[
    ("name", "name", FieldType::String),
    ("macAddress", "mac-address", FieldType::Mac),
    ("mtu", "mtu", FieldType::Int),
    ("running", "running", FieldType::Bool),
    ("comment", "comment", FieldType::String),
    ("speed", "speed", FieldType::String),
    ("autoNegotiation", "auto-negotiation", FieldType::Bool),
];

const SYSTEM_RESOURCE: &[(&str, &str, FieldType)] = &[
    ("version", "version", FieldType::String),
    ("uptime", "uptime", FieldType::Duration),
    ("cpuLoad", "cpu-load", FieldType::Int),
    ("freeMemory", "free-memory", FieldType::Size),
    ("totalMemory", "total-memory", FieldType::Size),
    ("freeHddSpace", "free-hdd-space", FieldType::Size),
    ("totalHddSpace", "total-hdd-space", FieldType::Size),
    ("boardName", "board-name", FieldType::String),
    ("architectureName", "architecture-name", FieldType::String),
];

const ROUTERBOARD: &[(&str, &str, FieldType)] = &[("model", "model", FieldType::String)];

const IP_ADDRESS: &[(&str, &str, FieldType)] = &[
    ("address", "address", FieldType::String),
    ("network", "network", FieldType::Ip),
    ("interface", "interface", FieldType::String),
    ("disabled", "disabled", FieldType::Bool),
    ("invalid", "invalid", FieldType::Bool),
    ("dynamic", "dynamic", FieldType::Bool),
    ("comment", "comment", FieldType::String),
];

/// The stock mappings for interfaces, system resources, and IP addresses.
pub fn default_field_mappings() -> Vec<FieldMapping> {
    [
        ("/interface", INTERFACE),
        ("/interface/ethernet", ETHERNET),
        ("/system/resource", SYSTEM_RESOURCE),
        ("/system/routerboard", ROUTERBOARD),
        ("/ip/address", IP_ADDRESS),
    ]
    .into_iter()
    .flat_map(|(path, fields)| {
        fields
            .iter()
            .map(move |&(logical, device, ty)| FieldMapping::new(path, logical, device, ty))
    })
    .collect()
}

pub fn default_registry() -> FieldMappingRegistry {
    let registry = FieldMappingRegistry::new();
    registry.register_all(default_field_mappings());
    registry
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn stock_registry_covers_core_paths() {
        let reg = default_registry();
        assert_eq!(
            reg.paths(),
            vec![
                "/interface",
                "/interface/ethernet",
                "/ip/address",
                "/system/resource",
                "/system/routerboard"
            ]
        );
        assert_eq!(reg.len(), default_field_mappings().len());
    }

    #[test]
    fn ethernet_mtu_is_an_int() {
        let reg = default_registry();
        assert_eq!(
            reg.mapping("/interface/ethernet", "mtu").unwrap().field_type,
            FieldType::Int
        );
        assert_eq!(
            reg.logical_field("/interface/ethernet", "mac-address").as_deref(),
            Some("macAddress")
        );
    }

    #[test]
    fn uptime_is_a_duration() {
        let reg = default_registry();
        let m = reg.mapping_for_device("/system/resource", "uptime").unwrap();
        assert_eq!(m.field_type, FieldType::Duration);
    }
}
