// ── Stock version mappings ──
//
// The known RouterOS 6 -> 7 renames and feature floors.

use super::registry::{FieldVersionMapping, PathMapping, VersionMapping, VersionMappingRegistry};
use crate::model::DeviceVersion;

fn path(canonical: &str, ros6: Option<&str>, ros7: Option<&str>, note: &str) -> PathMapping {
    PathMapping {
        canonical_path: canonical.to_owned(),
        ros6_path: ros6.map(str::to_owned),
        ros7_path: ros7.map(str::to_owned),
        note: Some(note.to_owned()).filter(|n| !n.is_empty()),
    }
}

fn field(path: &str, canonical: &str, ros6: &str, ros7: &str) -> FieldVersionMapping {
    FieldVersionMapping {
        path: path.to_owned(),
        canonical_field: canonical.to_owned(),
        ros6_field: Some(ros6.to_owned()),
        ros7_field: Some(ros7.to_owned()),
        note: None,
    }
}

pub fn default_version_mappings() -> Vec<VersionMapping> {
    vec![
        VersionMapping {
            path_mappings: vec![
                path(
                    "/interface/wireless",
                    Some("/interface/wireless"),
                    Some("/interface/wifiwave2"),
                    "7.x uses wifiwave2 for modern wireless hardware",
                ),
                path(
                    "/interface/wireless/security-profiles",
                    Some("/interface/wireless/security-profiles"),
                    Some("/interface/wifiwave2/security"),
                    "security profiles were restructured in 7.x",
                ),
            ],
            field_mappings: vec![
                field("/interface/wireless", "securityProfile", "security-profile", "security"),
                field("/interface/wireless", "frequencyMode", "frequency-mode", "channel"),
            ],
            ..VersionMapping::new("wireless")
        },
        VersionMapping {
            min_version: Some(DeviceVersion::new(7, 4)),
            path_mappings: vec![path("/container", None, Some("/container"), "")],
            ..VersionMapping::new("container")
        },
        VersionMapping {
            min_version: Some(DeviceVersion::new(7, 1)),
            note: Some("REST API requires RouterOS 7.1 or later".to_owned()),
            ..VersionMapping::new("rest-api")
        },
        VersionMapping {
            min_version: Some(DeviceVersion::new(7, 0)),
            path_mappings: vec![
                path("/iot/bluetooth", None, Some("/iot/bluetooth"), ""),
                path("/iot/lora", None, Some("/iot/lora"), ""),
            ],
            ..VersionMapping::new("iot")
        },
        VersionMapping {
            field_mappings: vec![field(
                "/ip/firewall/filter",
                "connectionState",
                "connection-state",
                "connection-state",
            )],
            ..VersionMapping::new("firewall")
        },
        VersionMapping {
            path_mappings: vec![
                path(
                    "/routing/ospf/instance",
                    Some("/routing/ospf/instance"),
                    Some("/routing/ospf/instance"),
                    "OSPF configuration changed shape in 7.x",
                ),
                path(
                    "/routing/bgp/instance",
                    Some("/routing/bgp/instance"),
                    Some("/routing/bgp/connection"),
                    "BGP instances became connections in 7.x",
                ),
            ],
            ..VersionMapping::new("routing")
        },
        VersionMapping {
            field_mappings: vec![
                field("/interface/bridge", "protocolMode", "protocol-mode", "protocol-mode"),
                field("/interface/bridge", "vlanFiltering", "vlan-filtering", "vlan-filtering"),
            ],
            ..VersionMapping::new("bridge")
        },
    ]
}

pub fn default_version_registry() -> VersionMappingRegistry {
    let registry = VersionMappingRegistry::new();
    registry.register_all(default_version_mappings());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_stock_features() {
        assert_eq!(
            default_version_registry().features(),
            vec!["bridge", "container", "firewall", "iot", "rest-api", "routing", "wireless"]
        );
    }

    #[test]
    fn bgp_instances_become_connections() {
        let reg = default_version_registry();
        assert_eq!(
            reg.get_path("/routing/bgp/instance", Some(&DeviceVersion::new(7, 10))),
            "/routing/bgp/connection"
        );
        assert_eq!(
            reg.get_path("/routing/bgp/instance", Some(&DeviceVersion::new(6, 48))),
            "/routing/bgp/instance"
        );
    }
}
