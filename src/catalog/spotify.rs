use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::error::CatalogError;
use super::models::{AlbumSummary, Cursor, Page, PlaylistSummary, TimeRange, Track};
use super::traits::MusicCatalog;

pub const API_BASE: &str = "https://api.spotify.com/v1";

/// Transport-level ceiling. The executor enforces its own, usually longer, deadline.
pub const REQUEST_TIMEOUT_SECONDS: u64 = 90;

const PLAYLIST_PAGE_LIMIT: usize = 50;
const PLAYLIST_ITEMS_LIMIT: usize = 100;
const SAVED_TRACKS_LIMIT: usize = 50;
const MARKET: &str = "US";

#[derive(Deserialize)]
struct UserProfile {
    id: String,
}

#[derive(Deserialize)]
struct Paging<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next: Option<String>,
}

#[derive(Deserialize)]
struct ItemWrapper {
    track: Option<TrackRef>,
}

#[derive(Deserialize)]
struct TrackRef {
    id: Option<String>,
}

#[derive(Deserialize)]
struct ArtistRef {
    id: Option<String>,
    name: String,
}

#[derive(Deserialize)]
struct TrackObject {
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<ArtistRef>,
}

impl TrackObject {
    fn into_track(self) -> Option<Track> {
        let id = self.id?;
        let (artist_name, artist_id) = match self.artists.into_iter().next() {
            Some(artist) => (artist.name, artist.id),
            None => ("Unknown".to_string(), None),
        };
        Some(Track {
            id,
            title: self.name,
            artist_name,
            artist_id,
        })
    }
}

#[derive(Deserialize)]
struct TracksEnvelope {
    tracks: Vec<Option<TrackObject>>,
}

#[derive(Deserialize)]
struct TopTracksEnvelope {
    tracks: Vec<TrackObject>,
}

#[derive(Deserialize)]
struct NamedObject {
    id: String,
    name: String,
}

/// [`MusicCatalog`] backed by the Spotify Web API.
///
/// Authentication is the caller's job: hand over a valid OAuth access token
/// carrying the playlist-read/modify, user-top-read and user-library-read scopes.
pub struct SpotifyWebCatalog {
    client: Client,
    access_token: String,
    base_url: String,
}

impl SpotifyWebCatalog {
    pub fn new(access_token: impl Into<String>) -> Result<Self, CatalogError> {
        Self::with_base_url(access_token, API_BASE)
    }

    pub fn with_base_url(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .user_agent(concat!("playlistrx/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            access_token: access_token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
    }

    /// Follow a cursor when present, otherwise issue the first request.
    fn page_request(
        &self,
        cursor: Option<Cursor>,
        path: &str,
        params: &[(&str, String)],
    ) -> RequestBuilder {
        match cursor {
            Some(next) => self.request(Method::GET, &next),
            None => self.request(Method::GET, &self.url(path)).query(params),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, CatalogError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let url_debug = response.url().to_string();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            log::warn!("Rate limit (429) at {}", url_debug);
            return Err(CatalogError::rate_limited(retry_after));
        }

        let text = response.text().await.unwrap_or_default();
        log::debug!("Request failed ({}) at {}: {}", status, url_debug, text);
        Err(CatalogError::status(status.as_u16(), text))
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, CatalogError> {
        let response = self.send(request).await?;
        let text = response
            .text()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;
        serde_json::from_str(&text).map_err(CatalogError::from)
    }

    fn track_uris(track_ids: &[String]) -> Vec<String> {
        track_ids
            .iter()
            .map(|id| format!("spotify:track:{}", id))
            .collect()
    }

    fn playlist_path(playlist_id: &str) -> String {
        format!("/playlists/{}/tracks", urlencoding::encode(playlist_id))
    }

    fn id_page(paging: Paging<ItemWrapper>) -> Page<Option<String>> {
        Page {
            items: paging
                .items
                .into_iter()
                .map(|item| item.track.and_then(|t| t.id))
                .collect(),
            next: paging.next,
        }
    }
}

#[async_trait]
impl MusicCatalog for SpotifyWebCatalog {
    async fn current_user_id(&self) -> Result<String, CatalogError> {
        let profile: UserProfile = self
            .fetch_json(self.request(Method::GET, &self.url("/me")))
            .await?;
        Ok(profile.id)
    }

    async fn user_playlists(
        &self,
        cursor: Option<Cursor>,
    ) -> Result<Page<PlaylistSummary>, CatalogError> {
        let params = [("limit", PLAYLIST_PAGE_LIMIT.to_string())];
        let paging: Paging<NamedObject> = self
            .fetch_json(self.page_request(cursor, "/me/playlists", &params))
            .await?;

        Ok(Page {
            items: paging
                .items
                .into_iter()
                .map(|p| PlaylistSummary {
                    id: p.id,
                    name: p.name,
                })
                .collect(),
            next: paging.next,
        })
    }

    async fn playlist_items(
        &self,
        playlist_id: &str,
        cursor: Option<Cursor>,
    ) -> Result<Page<Option<String>>, CatalogError> {
        let params = [
            ("limit", PLAYLIST_ITEMS_LIMIT.to_string()),
            ("fields", "items.track.id,next".to_string()),
            ("additional_types", "track".to_string()),
        ];
        let paging: Paging<ItemWrapper> = self
            .fetch_json(self.page_request(cursor, &Self::playlist_path(playlist_id), &params))
            .await?;
        Ok(Self::id_page(paging))
    }

    async fn saved_tracks(
        &self,
        cursor: Option<Cursor>,
    ) -> Result<Page<Option<String>>, CatalogError> {
        let params = [("limit", SAVED_TRACKS_LIMIT.to_string())];
        let paging: Paging<ItemWrapper> = self
            .fetch_json(self.page_request(cursor, "/me/tracks", &params))
            .await?;
        Ok(Self::id_page(paging))
    }

    async fn top_tracks(
        &self,
        offset: usize,
        limit: usize,
        time_range: TimeRange,
    ) -> Result<Vec<String>, CatalogError> {
        let request = self.request(Method::GET, &self.url("/me/top/tracks")).query(&[
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
            ("time_range", time_range.as_str().to_string()),
        ]);
        let paging: Paging<TrackRef> = self.fetch_json(request).await?;
        Ok(paging.items.into_iter().filter_map(|t| t.id).collect())
    }

    async fn tracks(&self, ids: &[String]) -> Result<Vec<Option<Track>>, CatalogError> {
        let request = self
            .request(Method::GET, &self.url("/tracks"))
            .query(&[("ids", ids.join(","))]);
        let envelope: TracksEnvelope = self.fetch_json(request).await?;
        Ok(envelope
            .tracks
            .into_iter()
            .map(|slot| slot.and_then(TrackObject::into_track))
            .collect())
    }

    async fn artist_top_tracks(&self, artist_id: &str) -> Result<Vec<Track>, CatalogError> {
        let path = format!("/artists/{}/top-tracks", urlencoding::encode(artist_id));
        let request = self
            .request(Method::GET, &self.url(&path))
            .query(&[("market", MARKET)]);
        let envelope: TopTracksEnvelope = self.fetch_json(request).await?;
        Ok(envelope
            .tracks
            .into_iter()
            .filter_map(TrackObject::into_track)
            .collect())
    }

    async fn artist_albums(&self, artist_id: &str) -> Result<Vec<AlbumSummary>, CatalogError> {
        let path = format!("/artists/{}/albums", urlencoding::encode(artist_id));
        let request = self
            .request(Method::GET, &self.url(&path))
            .query(&[("include_groups", "album,single"), ("limit", "50")]);
        let paging: Paging<NamedObject> = self.fetch_json(request).await?;
        Ok(paging
            .items
            .into_iter()
            .map(|a| AlbumSummary {
                id: a.id,
                name: a.name,
            })
            .collect())
    }

    async fn album_tracks(&self, album_id: &str) -> Result<Vec<Track>, CatalogError> {
        let path = format!("/albums/{}/tracks", urlencoding::encode(album_id));
        let paging: Paging<TrackObject> = self
            .fetch_json(self.request(Method::GET, &self.url(&path)))
            .await?;
        Ok(paging
            .items
            .into_iter()
            .filter_map(TrackObject::into_track)
            .collect())
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<PlaylistSummary, CatalogError> {
        let path = format!("/users/{}/playlists", urlencoding::encode(user_id));
        let request = self.request(Method::POST, &self.url(&path)).json(&json!({
            "name": name,
            "public": false,
            "description": description,
        }));
        let created: NamedObject = self.fetch_json(request).await?;
        Ok(PlaylistSummary {
            id: created.id,
            name: created.name,
        })
    }

    async fn replace_playlist_items(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        let request = self
            .request(Method::PUT, &self.url(&Self::playlist_path(playlist_id)))
            .json(&json!({ "uris": Self::track_uris(track_ids) }));
        self.send(request).await?;
        Ok(())
    }

    async fn add_playlist_items(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        let request = self
            .request(Method::POST, &self.url(&Self::playlist_path(playlist_id)))
            .json(&json!({ "uris": Self::track_uris(track_ids) }));
        self.send(request).await?;
        Ok(())
    }
}
