use std::future::Future;

use duet_core::{DuetClient, DuetError, RemoteListing};
use tokio::io::AsyncWrite;

/// What the sync engine needs from the device.
pub trait RemoteSource {
    /// Complete, sorted listing of one remote directory.
    fn fetch_listing(
        &self,
        dir: &str,
    ) -> impl Future<Output = Result<RemoteListing, DuetError>> + Send;

    /// Streams the contents of one remote file into `out` and returns the
    /// number of bytes written.
    fn download_to<W: AsyncWrite + Unpin + Send>(
        &self,
        path: &str,
        out: &mut W,
    ) -> impl Future<Output = Result<u64, DuetError>> + Send;
}

impl RemoteSource for DuetClient {
    async fn fetch_listing(&self, dir: &str) -> Result<RemoteListing, DuetError> {
        self.list_directory_all(dir).await
    }

    async fn download_to<W: AsyncWrite + Unpin + Send>(
        &self,
        path: &str,
        out: &mut W,
    ) -> Result<u64, DuetError> {
        DuetClient::download_to(self, path, out).await
    }
}

impl<R: RemoteSource + Sync> RemoteSource for &R {
    async fn fetch_listing(&self, dir: &str) -> Result<RemoteListing, DuetError> {
        (**self).fetch_listing(dir).await
    }

    async fn download_to<W: AsyncWrite + Unpin + Send>(
        &self,
        path: &str,
        out: &mut W,
    ) -> Result<u64, DuetError> {
        (**self).download_to(path, out).await
    }
}
