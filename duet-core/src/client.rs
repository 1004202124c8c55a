use std::io;
use std::time::SystemTime;

use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;
use url::Url;

use crate::listing::{FileListPage, RemoteListing};
use crate::timestamp::format_wire_timestamp;

const FILE_LIST_PATH: &str = "/rr_filelist";
const DOWNLOAD_PATH: &str = "/rr_download";
const CONNECT_PATH: &str = "/rr_connect";

#[derive(Debug, Error)]
pub enum DuetError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("device returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("malformed file list for {dir}: {source}")]
    Decode {
        dir: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("file list for {dir} did not advance past cursor {next}")]
    StalledCursor { dir: String, next: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Clone)]
pub struct DuetClient {
    http: Client,
    base_url: Url,
}

impl DuetClient {
    pub fn new(base_url: &str) -> Result<Self, DuetError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Opens a session on the device.
    ///
    /// Only transport failures are reported; whatever status or body the
    /// device answers with is ignored.
    pub async fn connect(&self, password: &str) -> Result<(), DuetError> {
        let mut url = self.endpoint(CONNECT_PATH)?;
        url.query_pairs_mut()
            .append_pair("password", password)
            .append_pair("time", &format_wire_timestamp(SystemTime::now()));
        let response = self.http.get(url).send().await?;
        debug!(status = %response.status(), "rr_connect answered");
        Ok(())
    }

    /// Fetches a single page of a directory listing.
    pub async fn list_page(&self, dir: &str, first: Option<u64>) -> Result<FileListPage, DuetError> {
        let mut url = self.endpoint(FILE_LIST_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("dir", dir);
            if let Some(first) = first {
                query.append_pair("first", &first.to_string());
            }
        }
        let response = self.http.get(url).send().await?;
        let body = Self::check_status(response).await?.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| DuetError::Decode {
            dir: dir.to_string(),
            source,
        })
    }

    /// Fetches every page of a directory listing and sorts the result.
    pub async fn list_directory_all(&self, dir: &str) -> Result<RemoteListing, DuetError> {
        let mut page = self.list_page(dir, None).await?;
        let mut entries = std::mem::take(&mut page.files);
        let mut pages = 1usize;
        let mut cursor = 0u64;
        while page.next > 0 {
            if page.next <= cursor {
                return Err(DuetError::StalledCursor {
                    dir: dir.to_string(),
                    next: page.next,
                });
            }
            cursor = page.next;
            page = self.list_page(dir, Some(cursor)).await?;
            entries.append(&mut page.files);
            pages += 1;
        }
        debug!(dir, pages, entries = entries.len(), "file list assembled");
        Ok(RemoteListing::new(dir, entries))
    }

    /// Streams the contents of a remote file into `out` and returns the
    /// number of bytes written. Write failures surface as [`DuetError::Io`].
    pub async fn download_to<W>(&self, name: &str, out: &mut W) -> Result<u64, DuetError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut url = self.endpoint(DOWNLOAD_PATH)?;
        url.query_pairs_mut().append_pair("name", name);
        let response = self.http.get(url).send().await?;
        let mut stream = Self::check_status(response).await?.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        out.flush().await?;
        Ok(written)
    }

    fn endpoint(&self, path: &str) -> Result<Url, DuetError> {
        Ok(self.base_url.join(path)?)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DuetError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(DuetError::Api { status, body })
        }
    }
}
