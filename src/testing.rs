//! In-memory catalog used by unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

use crate::catalog::{
    AlbumSummary, CatalogError, Cursor, MusicCatalog, Page, PlaylistSummary, TimeRange, Track,
};

struct FakePlaylist {
    id: String,
    name: String,
    items: Vec<Option<String>>,
}

#[derive(Default)]
struct FakeState {
    playlists: Vec<FakePlaylist>,
    liked: Vec<Option<String>>,
    top: Vec<String>,
    tracks: HashMap<String, Track>,
    artist_top: HashMap<String, Vec<Track>>,
    artist_albums: HashMap<String, Vec<AlbumSummary>>,
    album_tracks: HashMap<String, Vec<Track>>,
    created: usize,
    largest_track_batch: usize,
}

/// Scripted [`MusicCatalog`]. Cursors are plain offsets.
///
/// Any request that mentions an id registered with [`FakeCatalog::failing`]
/// fails with HTTP 400, which the executor retries without sleeping.
pub(crate) struct FakeCatalog {
    page_size: usize,
    endless_cursor: bool,
    failing: HashSet<String>,
    state: Mutex<FakeState>,
    requests: Mutex<HashMap<&'static str, usize>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            page_size: 100,
            endless_cursor: false,
            failing: HashSet::new(),
            state: Mutex::new(FakeState::default()),
            requests: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Keep handing out a continuation even past the last item.
    pub fn with_endless_cursor(mut self) -> Self {
        self.endless_cursor = true;
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn with_playlist(self, id: &str, name: &str, items: &[String]) -> Self {
        let slots = items.iter().cloned().map(Some).collect();
        self.with_playlist_slots(id, name, slots)
    }

    pub fn with_playlist_slots(self, id: &str, name: &str, items: Vec<Option<String>>) -> Self {
        self.state.lock().playlists.push(FakePlaylist {
            id: id.to_string(),
            name: name.to_string(),
            items,
        });
        self
    }

    pub fn with_liked(self, ids: &[String]) -> Self {
        self.state.lock().liked = ids.iter().cloned().map(Some).collect();
        self
    }

    pub fn with_top(self, ids: &[String]) -> Self {
        self.state.lock().top = ids.to_vec();
        self
    }

    pub fn with_track(self, track: Track) -> Self {
        self.state.lock().tracks.insert(track.id.clone(), track);
        self
    }

    pub fn with_tracks(self, tracks: impl IntoIterator<Item = Track>) -> Self {
        {
            let mut state = self.state.lock();
            for track in tracks {
                state.tracks.insert(track.id.clone(), track);
            }
        }
        self
    }

    pub fn with_artist_top(self, artist_id: &str, tracks: Vec<Track>) -> Self {
        self.state
            .lock()
            .artist_top
            .insert(artist_id.to_string(), tracks);
        self
    }

    pub fn with_artist_albums(self, artist_id: &str, albums: Vec<AlbumSummary>) -> Self {
        self.state
            .lock()
            .artist_albums
            .insert(artist_id.to_string(), albums);
        self
    }

    pub fn with_album_tracks(self, album_id: &str, tracks: Vec<Track>) -> Self {
        self.state
            .lock()
            .album_tracks
            .insert(album_id.to_string(), tracks);
        self
    }

    /// Requests received by `method`, failed ones included.
    pub fn requests(&self, method: &str) -> usize {
        self.requests.lock().get(method).copied().unwrap_or(0)
    }

    pub fn largest_track_batch(&self) -> usize {
        self.state.lock().largest_track_batch
    }

    pub fn playlist_contents(&self, playlist_id: &str) -> Vec<String> {
        self.state
            .lock()
            .playlists
            .iter()
            .find(|p| p.id == playlist_id)
            .map(|p| p.items.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }

    pub fn playlist_contents_by_name(&self, name: &str) -> Vec<String> {
        let id = self
            .state
            .lock()
            .playlists
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.id.clone());
        id.map(|id| self.playlist_contents(&id)).unwrap_or_default()
    }

    fn record(&self, method: &'static str) {
        *self.requests.lock().entry(method).or_insert(0) += 1;
    }

    fn check<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Result<(), CatalogError> {
        for id in ids {
            if self.failing.contains(id) {
                return Err(CatalogError::status(400, format!("scripted failure for {}", id)));
            }
        }
        Ok(())
    }

    fn page<T: Clone>(&self, items: &[T], cursor: Option<Cursor>) -> Result<Page<T>, CatalogError> {
        let offset = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|e| CatalogError::Parse(e.to_string()))?,
            None => 0,
        };
        let start = offset.min(items.len());
        let end = (offset + self.page_size).min(items.len());
        let more = end < items.len() || self.endless_cursor;
        Ok(Page {
            items: items[start..end].to_vec(),
            next: more.then(|| (offset + self.page_size).to_string()),
        })
    }

    fn playlist_mut<'a>(
        state: &'a mut FakeState,
        playlist_id: &str,
    ) -> Result<&'a mut FakePlaylist, CatalogError> {
        state
            .playlists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .ok_or_else(|| CatalogError::status(404, format!("no playlist {}", playlist_id)))
    }
}

#[async_trait]
impl MusicCatalog for FakeCatalog {
    async fn current_user_id(&self) -> Result<String, CatalogError> {
        self.record("current_user_id");
        Ok("tester".to_string())
    }

    async fn user_playlists(
        &self,
        cursor: Option<Cursor>,
    ) -> Result<Page<PlaylistSummary>, CatalogError> {
        self.record("user_playlists");
        let summaries: Vec<PlaylistSummary> = self
            .state
            .lock()
            .playlists
            .iter()
            .map(|p| PlaylistSummary {
                id: p.id.clone(),
                name: p.name.clone(),
            })
            .collect();
        self.page(&summaries, cursor)
    }

    async fn playlist_items(
        &self,
        playlist_id: &str,
        cursor: Option<Cursor>,
    ) -> Result<Page<Option<String>>, CatalogError> {
        self.record("playlist_items");
        self.check([playlist_id])?;
        let items = {
            let mut state = self.state.lock();
            Self::playlist_mut(&mut state, playlist_id)?.items.clone()
        };
        self.page(&items, cursor)
    }

    async fn saved_tracks(
        &self,
        cursor: Option<Cursor>,
    ) -> Result<Page<Option<String>>, CatalogError> {
        self.record("saved_tracks");
        let liked = self.state.lock().liked.clone();
        self.page(&liked, cursor)
    }

    async fn top_tracks(
        &self,
        offset: usize,
        limit: usize,
        _time_range: TimeRange,
    ) -> Result<Vec<String>, CatalogError> {
        self.record("top_tracks");
        let state = self.state.lock();
        Ok(state.top.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn tracks(&self, ids: &[String]) -> Result<Vec<Option<Track>>, CatalogError> {
        self.record("tracks");
        self.check(ids.iter().map(String::as_str))?;
        let mut state = self.state.lock();
        state.largest_track_batch = state.largest_track_batch.max(ids.len());
        Ok(ids.iter().map(|id| state.tracks.get(id).cloned()).collect())
    }

    async fn artist_top_tracks(&self, artist_id: &str) -> Result<Vec<Track>, CatalogError> {
        self.record("artist_top_tracks");
        self.check([artist_id])?;
        Ok(self
            .state
            .lock()
            .artist_top
            .get(artist_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn artist_albums(&self, artist_id: &str) -> Result<Vec<AlbumSummary>, CatalogError> {
        self.record("artist_albums");
        self.check([artist_id])?;
        Ok(self
            .state
            .lock()
            .artist_albums
            .get(artist_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn album_tracks(&self, album_id: &str) -> Result<Vec<Track>, CatalogError> {
        self.record("album_tracks");
        self.check([album_id])?;
        Ok(self
            .state
            .lock()
            .album_tracks
            .get(album_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_playlist(
        &self,
        _user_id: &str,
        name: &str,
        _description: &str,
    ) -> Result<PlaylistSummary, CatalogError> {
        self.record("create_playlist");
        let mut state = self.state.lock();
        state.created += 1;
        let id = format!("created{}", state.created);
        state.playlists.push(FakePlaylist {
            id: id.clone(),
            name: name.to_string(),
            items: Vec::new(),
        });
        Ok(PlaylistSummary {
            id,
            name: name.to_string(),
        })
    }

    async fn replace_playlist_items(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        self.record("replace_playlist_items");
        self.check([playlist_id])?;
        let mut state = self.state.lock();
        Self::playlist_mut(&mut state, playlist_id)?.items =
            track_ids.iter().cloned().map(Some).collect();
        Ok(())
    }

    async fn add_playlist_items(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        self.record("add_playlist_items");
        self.check([playlist_id])?;
        let mut state = self.state.lock();
        Self::playlist_mut(&mut state, playlist_id)?
            .items
            .extend(track_ids.iter().cloned().map(Some));
        Ok(())
    }
}

/// Deterministic [`RandomSource`](crate::curation::RandomSource).
///
/// Draws come from the script in order, then `0.0` forever. Shuffling
/// keeps the order and sampling takes the leading elements.
pub(crate) struct ScriptedRandom {
    script: Vec<f64>,
    taken: usize,
}

impl ScriptedRandom {
    pub fn new(script: &[f64]) -> Self {
        Self {
            script: script.to_vec(),
            taken: 0,
        }
    }

    pub fn draws_taken(&self) -> usize {
        self.taken
    }
}

impl crate::curation::RandomSource for ScriptedRandom {
    fn draw(&mut self) -> f64 {
        let value = self.script.get(self.taken).copied().unwrap_or(0.0);
        self.taken += 1;
        value
    }

    fn shuffle<T>(&mut self, _items: &mut [T]) {}

    fn choose_many<T: Clone>(&mut self, items: &[T], amount: usize) -> Vec<T> {
        items.iter().take(amount).cloned().collect()
    }
}
