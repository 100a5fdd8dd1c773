use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    pub static ref HEX_COLOR_REGEX: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap();
    pub static ref RGB_COLOR_REGEX: Regex =
        Regex::new(r"^rgb\(\s*\d{1,3}\s*,\s*\d{1,3}\s*,\s*\d{1,3}\s*\)$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub id: i64,
    pub name: String,
    /// Always `#RRGGBB` in uppercase.
    pub hex: String,
    pub rgb: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateColorRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters long"))]
    pub name: String,
    #[validate(
        length(equal = 7, message = "Hex code must be 7 characters long (e.g. #RRGGBB)"),
        regex(path = *HEX_COLOR_REGEX, message = "Hex code must be in #RRGGBB format")
    )]
    pub hex: String,
    #[validate(
        length(min = 10, max = 50, message = "RGB code must be 10 to 50 characters long"),
        regex(path = *RGB_COLOR_REGEX, message = "RGB code must be in rgb(r, g, b) format")
    )]
    pub rgb: String,
}

/// Partial update: every supplied field is validated with the create rules.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateColorRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters long"))]
    pub name: Option<String>,
    #[validate(
        length(equal = 7, message = "Hex code must be 7 characters long (e.g. #RRGGBB)"),
        regex(path = *HEX_COLOR_REGEX, message = "Hex code must be in #RRGGBB format")
    )]
    pub hex: Option<String>,
    #[validate(
        length(min = 10, max = 50, message = "RGB code must be 10 to 50 characters long"),
        regex(path = *RGB_COLOR_REGEX, message = "RGB code must be in rgb(r, g, b) format")
    )]
    pub rgb: Option<String>,
}

/// A validated color ready to be inserted, hex already normalized.
#[derive(Debug, Clone)]
pub struct NewColor {
    pub name: String,
    pub hex: String,
    pub rgb: String,
}

/// Columns that actually differ from the stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorChanges {
    pub name: Option<String>,
    pub hex: Option<String>,
    pub rgb: Option<String>,
}

impl ColorChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.hex.is_none() && self.rgb.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColorQuery {
    pub offset: i64,
    pub limit: i64,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ColorsListResponse {
    pub colors: Vec<Color>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

pub fn normalize_hex(hex: &str) -> String {
    hex.to_uppercase()
}

/// Case-folded form of a name, used for uniqueness, lookup and search.
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str, hex: &str, rgb: &str) -> CreateColorRequest {
        CreateColorRequest {
            name: name.to_string(),
            hex: hex.to_string(),
            rgb: rgb.to_string(),
        }
    }

    #[test]
    fn accepts_well_formed_color() {
        assert!(create("Red", "#ff0000", "rgb(255,0,0)").validate().is_ok());
        assert!(create("Blue", "#0000FF", "rgb( 0 , 0 , 255 )").validate().is_ok());
    }

    #[test]
    fn rejects_malformed_hex() {
        for hex in ["#12345", "123456", "#GGGGGG", "#1234567", ""] {
            let errors = create("Red", hex, "rgb(255,0,0)").validate().unwrap_err();
            let fields = errors.field_errors();
            assert!(fields.contains_key("hex"), "{hex} should be rejected");
            assert_eq!(fields.len(), 1);
        }
    }

    #[test]
    fn rejects_malformed_rgb() {
        for rgb in ["rgb(255,0)", "rgba(1,2,3,4)", "rgb(1000,0,0)", "255,0,0", "rgb(a,b,c)"] {
            let errors = create("Red", "#FF0000", rgb).validate().unwrap_err();
            assert!(errors.field_errors().contains_key("rgb"), "{rgb} should be rejected");
        }
    }

    #[test]
    fn name_length_is_counted_in_characters() {
        assert!(create("", "#FF0000", "rgb(255,0,0)").validate().is_err());
        assert!(create(&"é".repeat(100), "#FF0000", "rgb(255,0,0)").validate().is_ok());
        assert!(create(&"a".repeat(101), "#FF0000", "rgb(255,0,0)").validate().is_err());
    }

    #[test]
    fn update_validates_only_supplied_fields() {
        assert!(UpdateColorRequest::default().validate().is_ok());

        let req = UpdateColorRequest {
            hex: Some("#12345".to_string()),
            ..Default::default()
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("hex"));
        assert!(!errors.field_errors().contains_key("name"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed = serde_json::from_str::<UpdateColorRequest>(r#"{"name":"Red","alpha":1}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn name_key_folds_non_ascii_letters() {
        assert_eq!(name_key("Красный"), "красный");
        assert_eq!(name_key("ÉMERAUDE"), "émeraude");
        assert_eq!(name_key("КРАСНЫЙ"), name_key("красный"));
    }

    #[test]
    fn hex_is_normalized_to_uppercase() {
        assert_eq!(normalize_hex("#ff00aa"), "#FF00AA");
    }
}
