//! Thin facade over the Spotify Web API endpoints used by the backend.
//!
//! Entity payloads are decoded into whatever `DeserializeOwned` type the
//! caller picks; `serde_json::Value` works when no model is at hand.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::{
    ApiClient,
    config::Config,
    errors::Error,
    types::{ErrorEnvelope, Paging, PlaylistTrack},
};

/// Largest id batch accepted by `GET /tracks`.
pub const MAX_SEVERAL_TRACKS: usize = 50;
/// Largest id batch accepted by `GET /audio-features`.
pub const MAX_SEVERAL_FEATURES: usize = 100;

#[derive(Clone)]
pub struct SpotifyClient {
    api: ApiClient,
}

impl SpotifyClient {
    pub fn new(config: Config) -> Result<Self, Error> {
        Ok(Self::from_api(ApiClient::new(config)?))
    }

    pub fn from_api(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn find_artist<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, Error> {
        self.find_entity("artists", id).await
    }

    pub async fn find_album<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, Error> {
        self.find_entity("albums", id).await
    }

    pub async fn find_track<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, Error> {
        self.find_entity("tracks", id).await
    }

    pub async fn find_audio_feature<T: DeserializeOwned>(
        &self,
        track_id: &str,
    ) -> Result<Option<T>, Error> {
        self.find_entity("audio-features", track_id).await
    }

    pub async fn find_audio_analysis<T: DeserializeOwned>(
        &self,
        track_id: &str,
    ) -> Result<Option<T>, Error> {
        self.find_entity("audio-analysis", track_id).await
    }

    pub async fn find_playlist<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, Error> {
        self.find_entity("playlists", id).await
    }

    /// Looks up tracks in batches of [`MAX_SEVERAL_TRACKS`]. Unknown ids yield `None`
    /// at their position.
    pub async fn several_tracks<T: DeserializeOwned>(
        &self,
        ids: &[String],
    ) -> Result<Vec<Option<T>>, Error> {
        self.find_several("tracks", "tracks", ids, MAX_SEVERAL_TRACKS)
            .await
    }

    pub async fn several_audio_features<T: DeserializeOwned>(
        &self,
        track_ids: &[String],
    ) -> Result<Vec<Option<T>>, Error> {
        self.find_several(
            "audio-features",
            "audio_features",
            track_ids,
            MAX_SEVERAL_FEATURES,
        )
        .await
    }

    /// Raw search result page for one entity kind (`track`, `playlist`, ...).
    pub async fn search(
        &self,
        kind: &str,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> Result<serde_json::Value, Error> {
        let builder = self.api.get("search")?.query(&[
            ("type", kind.to_string()),
            ("q", query.to_string()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ]);
        let resp = self.api.send(accept_json(builder)).await?;
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }
        Ok(resp.json().await?)
    }

    /// Every track of a playlist, following pagination. `None` if the playlist does not exist.
    pub async fn playlist_tracks<T: DeserializeOwned>(
        &self,
        playlist_id: &str,
    ) -> Result<Option<Vec<T>>, Error> {
        let mut tracks = Vec::new();
        let mut next = Some(format!(
            "playlists/{}/tracks",
            urlencoding::encode(playlist_id)
        ));
        let mut first_page = true;
        while let Some(page_url) = next.take() {
            let resp = self.api.send(accept_json(self.api.get(&page_url)?)).await?;
            let status = resp.status();
            if first_page && status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(api_error(resp).await);
            }
            let page: Paging<PlaylistTrack<T>> = resp.json().await?;
            debug!(
                playlist_id,
                offset = page.offset,
                limit = page.limit,
                received = page.items.len(),
                total = page.total,
                "playlist page fetched"
            );
            tracks.extend(page.items.into_iter().filter_map(|entry| entry.track));
            next = page.next;
            first_page = false;
        }
        Ok(Some(tracks))
    }

    async fn find_entity<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, Error> {
        let path = format!("{}/{}", collection, urlencoding::encode(id));
        let resp = self.api.send(accept_json(self.api.get(&path)?)).await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(resp.json().await?)),
            _ => Err(api_error(resp).await),
        }
    }

    async fn find_several<T: DeserializeOwned>(
        &self,
        collection: &str,
        property: &str,
        ids: &[String],
        chunk_size: usize,
    ) -> Result<Vec<Option<T>>, Error> {
        let mut found = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(chunk_size) {
            let builder = self
                .api
                .get(collection)?
                .query(&[("ids", chunk.join(","))]);
            let resp = self.api.send(accept_json(builder)).await?;
            if !resp.status().is_success() {
                return Err(api_error(resp).await);
            }
            let mut wrapper: serde_json::Value = resp.json().await?;
            let entries = wrapper.get_mut(property).map(serde_json::Value::take).ok_or_else(|| {
                Error::Api(
                    StatusCode::OK,
                    format!("Property \"{}\" should be present in the response", property),
                )
            })?;
            let batch: Vec<Option<T>> = serde_json::from_value(entries)?;
            found.extend(batch);
        }
        Ok(found)
    }
}

fn accept_json(builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    builder.header(reqwest::header::ACCEPT, "application/json")
}

async fn api_error(resp: Response) -> Error {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ if !body.is_empty() => body,
        _ => status.canonical_reason().unwrap_or_default().to_string(),
    };
    error!(status = %status, message = %message, "spotify api request failed");
    Error::Api(status, message)
}
