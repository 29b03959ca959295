//! Detection against a registry extended from a user profile file.

use std::path::Path;

use stream_platforms::{DetectionMethod, FormatDetector, PlatformRegistry};

const TIDAL: &str = r#"
[[platform]]
code = "tdl-tidal"
display_name = "TIDAL"
delimiter = ";"
date_patterns = ["dd/mm/yyyy"]
path_aliases = ["tidal"]

[[platform.columns]]
field = "artist"
aliases = ["Artist"]
required = true

[[platform.columns]]
field = "track"
aliases = ["Track Title"]
required = true

[[platform.columns]]
field = "date"
aliases = ["Stream Date"]
required = true

[[platform.columns]]
field = "metric_value"
aliases = ["Stream Count"]
required = true
"#;

fn extended_registry() -> PlatformRegistry {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("extra.toml");
    std::fs::write(&path, TIDAL).unwrap();

    let mut registry = PlatformRegistry::builtin().unwrap();
    registry.extend(PlatformRegistry::load_file(&path).unwrap());
    registry
}

#[test]
fn user_profile_is_detected_by_alias() {
    let registry = extended_registry();
    let detector = FormatDetector::new(&registry);
    let detection = detector
        .detect(Path::new("/inbox/tidal/2024-12.csv"), &[])
        .unwrap();
    assert_eq!(detection.profile.code, "tdl-tidal");
    assert_eq!(detection.method, DetectionMethod::PathAlias);
}

#[test]
fn user_profile_is_detected_by_header() {
    let registry = extended_registry();
    let detector = FormatDetector::new(&registry);
    let peek = vec!["Artist;Track Title;Stream Date;Stream Count".to_string()];
    let detection = detector.detect(Path::new("/inbox/export.csv"), &peek).unwrap();
    assert_eq!(detection.profile.code, "tdl-tidal");
    assert_eq!(detection.method, DetectionMethod::Header);
}
