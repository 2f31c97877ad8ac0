// ABOUTME: Integration tests for validated newtypes and parsed value types.
// ABOUTME: Service/network names, image references, port and volume specs.

use cellrig::topology::{PortBinding, VolumeSpec};
use cellrig::types::{ImageRef, NetworkName, ServiceName};

mod service_names {
    use super::*;

    #[test]
    fn accepts_rfc1123_labels() {
        for valid in ["app", "scene-store", "robot2", "a"] {
            assert!(ServiceName::new(valid).is_ok(), "{valid} should be valid");
        }
    }

    #[test]
    fn rejects_invalid_labels() {
        for invalid in ["", "App", "-app", "app-", "has_underscore", "has.dot", "a b"] {
            assert!(
                ServiceName::new(invalid).is_err(),
                "{invalid:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_names_over_63_chars() {
        let long = "a".repeat(64);
        assert!(ServiceName::new(&long).is_err());
        let max = "a".repeat(63);
        assert!(ServiceName::new(&max).is_ok());
    }
}

mod network_names {
    use super::*;

    #[test]
    fn accepts_common_forms() {
        for valid in ["net", "scene-net", "robot_net", "net.internal"] {
            assert!(NetworkName::new(valid).is_ok(), "{valid} should be valid");
        }
    }

    #[test]
    fn rejects_empty_and_bad_chars() {
        assert!(NetworkName::new("").is_err());
        assert!(NetworkName::new("   ").is_err());
        assert!(NetworkName::new("bad net").is_err());
        assert!(NetworkName::new("bad/net").is_err());
    }
}

mod image_refs {
    use super::*;

    #[test]
    fn bare_name_defaults_to_latest() {
        let image = ImageRef::parse("nginx").unwrap();
        assert_eq!(image.name(), "nginx");
        assert_eq!(image.tag(), Some("latest"));
        assert_eq!(image.registry(), None);
    }

    #[test]
    fn registry_and_tag_are_split() {
        let image = ImageRef::parse("registry.example.com/scene-store:1.2.0").unwrap();
        assert_eq!(image.registry(), Some("registry.example.com"));
        assert_eq!(image.name(), "scene-store");
        assert_eq!(image.tag(), Some("1.2.0"));
    }

    #[test]
    fn digest_suppresses_the_default_tag() {
        let image = ImageRef::parse("nginx@sha256:abc123").unwrap();
        assert_eq!(image.tag(), None);
        assert_eq!(image.digest(), Some("sha256:abc123"));
    }

    #[test]
    fn namespaced_name_without_registry() {
        let image = ImageRef::parse("library/nginx:alpine").unwrap();
        assert_eq!(image.registry(), None);
        assert_eq!(image.name(), "library/nginx");
    }

    #[test]
    fn rejects_invalid_references() {
        assert!(ImageRef::parse("").is_err());
        assert!(ImageRef::parse("has space").is_err());
    }

    #[test]
    fn display_round_trips() {
        let image = ImageRef::parse("registry.example.com/app:v1").unwrap();
        assert_eq!(image.to_string(), "registry.example.com/app:v1");
    }
}

mod port_bindings {
    use super::*;

    #[test]
    fn parses_host_and_container() {
        let binding = PortBinding::parse("8080:80").unwrap();
        assert_eq!(binding.host, Some(8080));
        assert_eq!(binding.container, 80);
        assert!(!binding.udp);
    }

    #[test]
    fn container_only_port_is_unpublished() {
        let binding = PortBinding::parse("9000").unwrap();
        assert_eq!(binding.host, None);
        assert_eq!(binding.container, 9000);
    }

    #[test]
    fn udp_suffix_is_honored() {
        let binding = PortBinding::parse("5353:53/udp").unwrap();
        assert!(binding.udp);
        let tcp = PortBinding::parse("80:80/tcp").unwrap();
        assert!(!tcp.udp);
    }

    #[test]
    fn rejects_garbage() {
        assert!(PortBinding::parse("eighty").is_none());
        assert!(PortBinding::parse("80:80/sctp").is_none());
        assert!(PortBinding::parse("80:").is_none());
    }
}

mod volume_specs {
    use super::*;

    #[test]
    fn parses_source_and_target() {
        let volume = VolumeSpec::parse("scene-data:/data/scene").unwrap();
        assert_eq!(volume.source, "scene-data");
        assert_eq!(volume.target, "/data/scene");
        assert!(!volume.read_only);
    }

    #[test]
    fn ro_suffix_marks_read_only() {
        let volume = VolumeSpec::parse("conf:/etc/app:ro").unwrap();
        assert!(volume.read_only);
    }

    #[test]
    fn rejects_bare_paths() {
        assert!(VolumeSpec::parse("/just/a/path").is_none());
    }
}
