use meridian_core::fs::{APP_PATH_SEPARATOR, to_app_path, to_native_path, to_native_path_with};
use meridian_core::AppPath;

#[test]
fn windows_example_round_trips_with_backslashes() {
    let app = to_app_path("D:\\Photos\\2024\\img.jpg");
    assert_eq!(app.as_str(), "D:>Photos>2024>img.jpg");
    assert_eq!(to_native_path_with(app.as_str(), '\\'), "D:\\Photos\\2024\\img.jpg");
}

#[test]
fn forward_slash_input_encodes_identically() {
    assert_eq!(to_app_path("D:/Photos/2024/img.jpg"), to_app_path("D:\\Photos\\2024\\img.jpg"));
}

#[test]
fn round_trip_normalises_redundant_separators() {
    let cases = [
        ("a//b\\\\c", "a/b/c"),
        ("/var/lib/media/", "var/lib/media"),
        ("\\\\server\\share\\clip.mp4", "server/share/clip.mp4"),
        ("single", "single"),
    ];
    for (input, expected) in cases {
        let decoded = to_native_path_with(to_app_path(input).as_str(), '/');
        assert_eq!(decoded, expected, "input {input:?}");
    }
}

#[test]
fn encoding_is_idempotent() {
    for input in ["C:\\Users\\me\\", "//a///b//", "", "plain", "x>y/z"] {
        let once = to_app_path(input);
        let twice = to_app_path(once.as_str());
        assert_eq!(once, twice, "input {input:?}");
    }
}

#[test]
fn output_has_no_edge_or_doubled_separators() {
    for input in ["///", "a\\/\\b", "\\lead", "trail//", "mid//dle"] {
        let encoded = to_app_path(input);
        let text = encoded.as_str();
        assert!(!text.starts_with(APP_PATH_SEPARATOR), "{text:?}");
        assert!(!text.ends_with(APP_PATH_SEPARATOR), "{text:?}");
        assert!(!text.contains(">>"), "{text:?}");
        assert!(!text.contains('/') && !text.contains('\\'), "{text:?}");
    }
}

#[test]
fn platform_decoding_round_trips_through_path() {
    let native = std::path::Path::new("photos").join("2024").join("img.jpg");
    let app = AppPath::from_native(&native);
    assert_eq!(app.as_str(), "photos>2024>img.jpg");
    assert_eq!(app.to_native(), native);
    assert_eq!(to_native_path(app.as_str()), native.to_string_lossy());
}

#[test]
fn app_path_serialises_as_plain_string() {
    let app = to_app_path("D:\\Photos");
    assert_eq!(serde_json::to_string(&app).unwrap(), "\"D:>Photos\"");
}

#[test]
fn deserialised_app_paths_are_canonical() {
    let app: AppPath = serde_json::from_str(r#""D:\\Photos//2024>""#).unwrap();
    assert_eq!(app, to_app_path("D:\\Photos\\2024"));
    assert_eq!(app.as_str(), "D:>Photos>2024");

    let canonical: AppPath = serde_json::from_str(r#""D:>Photos>2024""#).unwrap();
    assert_eq!(canonical, app);
}
