//! Request bodies that may arrive as JSON or as `multipart/form-data`.

use crate::{error::HttpError, AppError};
use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::{header, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// File part received in a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub field: String,
    pub file_name: String,
    pub len: usize,
}

/// Text parts (last value wins) and file parts of a multipart body.
#[derive(Debug, Default)]
pub struct FormFields {
    fields: HashMap<String, String>,
    pub files: Vec<FileAttachment>,
}

impl FormFields {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Text value with surrounding whitespace removed; blank counts as absent.
    pub fn non_empty(&self, name: &str) -> Option<String> {
        self.text(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn required(&self, name: &str) -> Result<&str, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing '{}' field", name)))
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: Vec::new(),
        }
    }
}

/// Payload types that can be read from multipart text parts.
pub trait FromFormFields: Sized {
    fn from_form(form: &FormFields) -> Result<Self, AppError>;
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
        .unwrap_or(false)
}

async fn read_form(mut multipart: Multipart) -> Result<FormFields, AppError> {
    let mut form = FormFields::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(err.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::BadRequest(err.body_text()))?;
                form.files.push(FileAttachment {
                    field: name,
                    file_name,
                    len: bytes.len(),
                });
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::BadRequest(err.body_text()))?;
                form.fields.insert(name, value);
            }
        }
    }
    Ok(form)
}

/// Extractor accepting either a JSON body or a multipart form.
pub struct JsonOrForm<T> {
    pub value: T,
    /// File parts; always empty for JSON bodies.
    pub attachments: Vec<FileAttachment>,
}

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + FromFormFields,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(req.headers()) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|err| AppError::BadRequest(err.body_text()))?;
            let form = read_form(multipart).await?;
            let value = T::from_form(&form)?;
            return Ok(Self {
                value,
                attachments: form.files,
            });
        }

        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| AppError::BadRequest(err.body_text()))?;
        Ok(Self {
            value,
            attachments: Vec::new(),
        })
    }
}
