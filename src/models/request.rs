use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Face swap request: the face in `source_image_base64` is placed onto the
/// first face found in `target_image_base64`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FaceSwapRequest {
    #[garde(length(min = 1))]
    pub source_image_base64: String,

    #[garde(length(min = 1))]
    pub target_image_base64: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(custom(callback_url_scheme))]
    pub callback_url: Option<String>,
}

/// Attributes describing a personality-test outcome, turned into an image
/// generation prompt.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TestAttributes {
    #[serde(default = "default_image_place")]
    #[garde(length(max = 500))]
    pub image_place: String,

    #[serde(default = "default_image_style")]
    #[garde(length(max = 500))]
    pub image_style: String,

    #[garde(length(min = 1, max = 2000))]
    pub test_sonucu: String,

    #[serde(rename = "test_adı")]
    #[garde(length(min = 1, max = 500))]
    pub test_adi: String,

    #[garde(length(min = 1, max = 2000))]
    pub test_aciklamasi: String,

    #[garde(length(min = 1, max = 50))]
    pub gender: String,

    #[garde(range(min = 0, max = 150))]
    pub age: u32,
}

fn default_image_place() -> String {
    "The place must be relevant to the test".to_string()
}

fn default_image_style() -> String {
    "The theme must be relevant to the test".to_string()
}

/// Generate-then-swap request: an image is generated from the test attributes
/// and the face in `source_face_image_base64` is swapped into it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TestImageRequest {
    #[serde(flatten)]
    #[garde(dive)]
    pub attributes: TestAttributes,

    #[garde(length(min = 1))]
    pub source_face_image_base64: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(custom(callback_url_scheme))]
    pub callback_url: Option<String>,
}

fn callback_url_scheme(value: &Option<String>, _ctx: &()) -> garde::Result {
    let Some(raw) = value else {
        return Ok(());
    };
    let url = reqwest::Url::parse(raw)
        .map_err(|e| garde::Error::new(format!("invalid callback url: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(garde::Error::new(format!(
            "callback url must use http or https, got `{other}`"
        ))),
    }
}

/// Immediate acknowledgement of an accepted job.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub message: String,
    pub request_id: Uuid,
}

/// Response of the synchronous face swap endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct DirectSwapResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swapped_image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_request_reads_turkish_field_names_and_defaults() {
        let req: TestImageRequest = serde_json::from_value(json!({
            "test_sonucu": "Very tidy",
            "test_adı": "How tidy are you",
            "test_aciklamasi": "Measures tidiness",
            "gender": "Male",
            "age": 25,
            "source_face_image_base64": "aGVsbG8="
        }))
        .unwrap();

        assert_eq!(req.attributes.test_adi, "How tidy are you");
        assert_eq!(req.attributes.image_place, "The place must be relevant to the test");
        assert_eq!(req.attributes.image_style, "The theme must be relevant to the test");
        assert!(req.callback_url.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn callback_url_must_be_http() {
        let mut req = FaceSwapRequest {
            source_image_base64: "a".into(),
            target_image_base64: "b".into(),
            callback_url: Some("ftp://example.com/hook".into()),
        };
        assert!(req.validate().is_err());

        req.callback_url = Some("not a url".into());
        assert!(req.validate().is_err());

        req.callback_url = Some("https://example.com/hook".into());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn empty_images_are_rejected() {
        let req = FaceSwapRequest {
            source_image_base64: String::new(),
            target_image_base64: "b".into(),
            callback_url: None,
        };
        assert!(req.validate().is_err());
    }
}
