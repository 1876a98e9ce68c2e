/// Errors produced while setting up the image-host client.
#[derive(Debug, thiserror::Error)]
pub enum ImgBedError {
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("no upload token configured (imgbed.upload_token)")]
    MissingToken,
}
