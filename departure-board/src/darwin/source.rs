//! Where raw departure boards come from.
//!
//! The poller is generic over [`BoardSource`] so it can run against the live
//! Darwin API or against boards saved on disk, for development without
//! credentials.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::board::BoardQuery;
use crate::domain::Crs;

use super::client::DarwinClient;
use super::error::DarwinError;

/// Something that can produce the raw JSON board for a query.
pub trait BoardSource {
    /// Fetch the departure board for `query`.
    ///
    /// `time_window` is how many minutes past the offset the board covers.
    fn fetch_board(
        &self,
        query: &BoardQuery,
        time_window: u16,
    ) -> impl Future<Output = Result<Value, DarwinError>> + Send;
}

/// Serves departure boards from JSON files.
///
/// Given a file, that board is returned for every query. Given a directory,
/// files named `{CRS}.json` (e.g. `PAD.json`) are served for queries from
/// that station. Bodies are parsed on each fetch, so a broken file surfaces
/// the same way a broken API response would.
#[derive(Debug, Clone)]
pub struct StaticBoardSource {
    boards: Arc<StaticBoards>,
}

#[derive(Debug)]
enum StaticBoards {
    Single(String),
    PerStation(HashMap<Crs, String>),
}

impl StaticBoardSource {
    /// Load boards from a file or a directory of `{CRS}.json` files.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DarwinError> {
        let path = path.as_ref();

        let boards = if path.is_dir() {
            StaticBoards::PerStation(load_dir(path)?)
        } else {
            let body = std::fs::read_to_string(path).map_err(|e| {
                DarwinError::StaticData(format!("failed to read {}: {e}", path.display()))
            })?;
            StaticBoards::Single(body)
        };

        info!(path = %path.display(), "serving static departure boards");

        Ok(Self {
            boards: Arc::new(boards),
        })
    }

    /// Serve one in-memory body for every query.
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            boards: Arc::new(StaticBoards::Single(body.into())),
        }
    }

    /// Stations with a board of their own, or `None` when one board is
    /// served for all.
    pub fn available_stations(&self) -> Option<Vec<Crs>> {
        match self.boards.as_ref() {
            StaticBoards::Single(_) => None,
            StaticBoards::PerStation(boards) => {
                let mut stations: Vec<Crs> = boards.keys().copied().collect();
                stations.sort();
                Some(stations)
            }
        }
    }

    fn body_for(&self, station: &Crs) -> Result<&str, DarwinError> {
        match self.boards.as_ref() {
            StaticBoards::Single(body) => Ok(body),
            StaticBoards::PerStation(boards) => {
                boards
                    .get(station)
                    .map(String::as_str)
                    .ok_or(DarwinError::NoBoard(*station))
            }
        }
    }
}

impl BoardSource for StaticBoardSource {
    async fn fetch_board(&self, query: &BoardQuery, _time_window: u16) -> Result<Value, DarwinError> {
        let body = self.body_for(&query.origin)?;
        serde_json::from_str(body).map_err(|e| DarwinError::InvalidBody {
            origin: query.origin,
            reason: e.to_string(),
        })
    }
}

fn load_dir(dir: &Path) -> Result<HashMap<Crs, String>, DarwinError> {
    let mut boards = HashMap::new();

    let entries = std::fs::read_dir(dir).map_err(|e| {
        DarwinError::StaticData(format!("failed to read directory {}: {e}", dir.display()))
    })?;

    for entry in entries {
        let entry = entry
            .map_err(|e| DarwinError::StaticData(format!("failed to read directory entry: {e}")))?;

        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }

        // "PAD.json" -> "PAD"
        let Some(crs) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| Crs::parse_normalized(s).ok())
        else {
            continue;
        };

        let body = std::fs::read_to_string(&path).map_err(|e| {
            DarwinError::StaticData(format!("failed to read {}: {e}", path.display()))
        })?;

        boards.insert(crs, body);
    }

    if boards.is_empty() {
        return Err(DarwinError::StaticData(format!(
            "no board files found in {}",
            dir.display()
        )));
    }

    Ok(boards)
}

/// The configured source: live API or files on disk.
#[derive(Debug, Clone)]
pub enum AnySource {
    Live(DarwinClient),
    Static(StaticBoardSource),
}

impl BoardSource for AnySource {
    async fn fetch_board(&self, query: &BoardQuery, time_window: u16) -> Result<Value, DarwinError> {
        match self {
            AnySource::Live(client) => client.fetch_board(query, time_window).await,
            AnySource::Static(source) => source.fetch_board(query, time_window).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crs(s: &str) -> Crs {
        Crs::parse(s).unwrap()
    }

    fn query(origin: &str) -> BoardQuery {
        BoardQuery::new(crs(origin), crs("PAD"))
    }

    #[tokio::test]
    async fn single_file_served_for_every_station() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        std::fs::write(&path, r#"{"locationName": "Reading", "trainServices": null}"#).unwrap();

        let source = StaticBoardSource::new(&path).unwrap();
        assert!(source.available_stations().is_none());

        for origin in ["RDG", "BRI"] {
            let board = source.fetch_board(&query(origin), 120).await.unwrap();
            assert_eq!(board["locationName"], "Reading");
        }
    }

    #[tokio::test]
    async fn directory_keyed_by_station() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("RDG.json"), r#"{"crs": "RDG"}"#).unwrap();
        std::fs::write(dir.path().join("bri.json"), r#"{"crs": "BRI"}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let source = StaticBoardSource::new(dir.path()).unwrap();
        assert_eq!(source.available_stations(), Some(vec![crs("BRI"), crs("RDG")]));

        let board = source.fetch_board(&query("BRI"), 120).await.unwrap();
        assert_eq!(board["crs"], "BRI");
    }

    #[tokio::test]
    async fn unknown_station_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("RDG.json"), "{}").unwrap();

        let source = StaticBoardSource::new(dir.path()).unwrap();
        let result = source.fetch_board(&query("XYZ"), 120).await;
        assert!(matches!(result, Err(DarwinError::NoBoard(station)) if station == crs("XYZ")));
    }

    #[tokio::test]
    async fn broken_body_is_json_error() {
        let source = StaticBoardSource::from_body("<html>oops</html>");
        let result = source.fetch_board(&query("RDG"), 120).await;
        assert!(matches!(result, Err(DarwinError::InvalidBody { origin, .. }) if origin == crs("RDG")));
    }

    #[test]
    fn empty_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            StaticBoardSource::new(dir.path()),
            Err(DarwinError::StaticData(_))
        ));
    }

    #[test]
    fn missing_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StaticBoardSource::new(dir.path().join("missing.json")).is_err());
    }
}
