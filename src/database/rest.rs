use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{Database, Reference};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::{Fetch, FetchBuilder};

/// Client for the realtime database REST API
pub struct RestDatabase {
    /// Database root, e.g. `https://project-default-rtdb.firebaseio.com/`
    url: Url,

    /// HTTP client used for requests
    client: Client,

    /// Client options
    options: ClientOptions,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

impl RestDatabase {
    /// Create a new RestDatabase
    pub fn new(url: Url, client: Client, options: ClientOptions) -> Self {
        Self {
            url,
            client,
            options,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `{root}/{segments}.json`
    fn endpoint(&self, at: &Reference) -> Result<String> {
        let mut url = self.url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| Error::config(format!("{} cannot be a database root", self.url)))?;
            path.pop_if_empty();
            match at.segments().split_last() {
                None => {
                    path.push(".json");
                }
                Some((last, parents)) => {
                    path.extend(parents);
                    path.push(&format!("{}.json", last));
                }
            }
        }
        Ok(url.into())
    }

    fn authorize<'a>(&self, request: FetchBuilder<'a>, token: &str) -> FetchBuilder<'a> {
        let request = request.timeout(self.options.request_timeout);
        if token.is_empty() {
            request
        } else {
            request.query("auth", token)
        }
    }
}

fn write_error(at: &Reference, error: Error) -> Error {
    match error {
        Error::Api { status, message } => {
            Error::remote_write(format!("{} ({}): {}", at, status, message))
        }
        Error::Http(e) => Error::remote_write(format!("{}: {}", at, e)),
        other => other,
    }
}

#[async_trait]
impl Database for RestDatabase {
    async fn push(&self, at: &Reference, value: Value, token: &str) -> Result<String> {
        let url = self.endpoint(at)?;
        let response = self
            .authorize(Fetch::post(&self.client, &url), token)
            .json(&value)?
            .execute::<PushResponse>()
            .await
            .map_err(|e| write_error(at, e))?;
        Ok(response.name)
    }

    async fn get(&self, at: &Reference, token: &str) -> Result<Option<Value>> {
        let url = self.endpoint(at)?;
        let value = self
            .authorize(Fetch::get(&self.client, &url), token)
            .execute::<Value>()
            .await?;
        Ok(Some(value).filter(|value| !value.is_null()))
    }

    async fn put(&self, at: &Reference, value: Value, token: &str) -> Result<()> {
        let url = self.endpoint(at)?;
        self.authorize(Fetch::put(&self.client, &url), token)
            .json(&value)?
            .send()
            .await
            .map_err(|e| write_error(at, e))?;
        Ok(())
    }

    async fn delete(&self, at: &Reference, token: &str) -> Result<()> {
        let url = self.endpoint(at)?;
        self.authorize(Fetch::delete(&self.client, &url), token)
            .send()
            .await
            .map_err(|e| write_error(at, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database(root: &str) -> RestDatabase {
        RestDatabase::new(
            Url::parse(root).unwrap(),
            Client::new(),
            ClientOptions::default(),
        )
    }

    #[test]
    fn endpoint_appends_json_suffix() {
        let db = database("https://demo-rtdb.firebaseio.com/");
        let at = Reference::root().child("product_scans/u1/-Nabc");
        assert_eq!(
            db.endpoint(&at).unwrap(),
            "https://demo-rtdb.firebaseio.com/product_scans/u1/-Nabc.json"
        );
    }

    #[test]
    fn endpoint_without_trailing_slash() {
        let db = database("https://demo-rtdb.firebaseio.com");
        let at = Reference::root().child("locations/u1");
        assert_eq!(
            db.endpoint(&at).unwrap(),
            "https://demo-rtdb.firebaseio.com/locations/u1.json"
        );
    }

    #[test]
    fn endpoint_escapes_segments() {
        let db = database("https://demo-rtdb.firebaseio.com/");
        let at = Reference::root().child("locations").child("a b");
        assert_eq!(
            db.endpoint(&at).unwrap(),
            "https://demo-rtdb.firebaseio.com/locations/a%20b.json"
        );
    }

    #[test]
    fn root_endpoint() {
        let db = database("https://demo-rtdb.firebaseio.com/");
        assert_eq!(
            db.endpoint(&Reference::root()).unwrap(),
            "https://demo-rtdb.firebaseio.com/.json"
        );
    }
}
