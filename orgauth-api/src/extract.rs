/// JSON body extractor with validation
///
/// `ValidatedJson<T>` deserializes the body like `axum::Json<T>` and then runs
/// `validator::Validate`. Both failure kinds become
/// [`ApiError::ValidationError`], so every malformed request gets a 422 with
/// `{"errors":[{"field","message"}]}`. An unreadable body reports the field
/// `body`.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::{ApiError, ValidationErrorDetail};

/// Validated JSON request body
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;

        value.validate().map_err(validation_to_error)?;

        Ok(ValidatedJson(value))
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    ApiError::ValidationError(vec![ValidationErrorDetail::new("body", rejection.body_text())])
}

/// Flattens `validator` errors into one detail per failed rule
///
/// Fields are reported in camelCase and sorted by name.
pub fn validation_to_error(errors: ValidationErrors) -> ApiError {
    let mut details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            let field = to_camel_case(&field.to_string());
            errors.iter().map(move |error| {
                ValidationErrorDetail::new(
                    field.clone(),
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field)),
                )
            })
        })
        .collect();

    details.sort_by(|a, b| a.field.cmp(&b.field));
    ApiError::ValidationError(details)
}

fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;

    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    struct Payload {
        #[validate(length(min = 1, message = "First name is required"))]
        first_name: String,

        #[validate(email(message = "Email must be a valid email"))]
        email: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn details(err: ApiError) -> Vec<ValidationErrorDetail> {
        match err {
            ApiError::ValidationError(details) => details,
            other => panic!("expected validation error, got {}", other),
        }
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("first_name"), "firstName");
        assert_eq!(to_camel_case("userId"), "userId");
        assert_eq!(to_camel_case("email"), "email");
    }

    #[tokio::test]
    async fn test_valid_body() {
        let req = json_request(r#"{"firstName":"Ada","email":"ada@example.com"}"#);
        let ValidatedJson(payload) = ValidatedJson::<Payload>::from_request(req, &())
            .await
            .unwrap();

        assert_eq!(payload.first_name, "Ada");
    }

    #[tokio::test]
    async fn test_rule_failures_reported_per_field() {
        let req = json_request(r#"{"firstName":"","email":"not-an-email"}"#);
        let err = ValidatedJson::<Payload>::from_request(req, &())
            .await
            .unwrap_err();

        assert_eq!(
            details(err),
            vec![
                ValidationErrorDetail::new("email", "Email must be a valid email"),
                ValidationErrorDetail::new("firstName", "First name is required"),
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_body_error() {
        for body in ["{not json", r#"{"email":"ada@example.com"}"#] {
            let err = ValidatedJson::<Payload>::from_request(json_request(body), &())
                .await
                .unwrap_err();

            let details = details(err);
            assert_eq!(details.len(), 1);
            assert_eq!(details[0].field, "body");
        }
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("{}"))
            .unwrap();

        let err = ValidatedJson::<Payload>::from_request(req, &()).await.unwrap_err();
        assert_eq!(details(err)[0].field, "body");
    }
}
