use facematch_core::pipeline::{self, PipelineError};
use facematch_core::types::GalleryError;
use facematch_core::{Classification, EmbeddingOracle, RegisteredFace, Session};
use image::RgbImage;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("register: {0}")]
    Gallery(#[from] GalleryError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Summary of one registered face, safe to hand across threads.
#[derive(Debug, Clone)]
pub struct FaceSummary {
    pub name: String,
    pub registered_at: String,
}

impl From<&RegisteredFace> for FaceSummary {
    fn from(face: &RegisteredFace) -> Self {
        Self {
            name: face.name.clone(),
            registered_at: face.registered_at.to_rfc3339(),
        }
    }
}

/// Messages sent from the front end to the engine thread.
enum EngineRequest {
    Register {
        name: String,
        face: RgbImage,
        reply: oneshot::Sender<Result<FaceSummary, EngineError>>,
    },
    Identify {
        face: RgbImage,
        reply: oneshot::Sender<Result<Classification, EngineError>>,
    },
    List {
        reply: oneshot::Sender<Vec<FaceSummary>>,
    },
    Last {
        reply: oneshot::Sender<Option<Classification>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineRequest,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Embed a 112x112 face crop and add it to the gallery under `name`.
    pub async fn register(&self, name: &str, face: RgbImage) -> Result<FaceSummary, EngineError> {
        let name = name.to_string();
        self.request(|reply| EngineRequest::Register { name, face, reply })
            .await?
    }

    /// Embed a face crop, classify it, and publish the result.
    pub async fn identify(&self, face: RgbImage) -> Result<Classification, EngineError> {
        self.request(|reply| EngineRequest::Identify { face, reply })
            .await?
    }

    pub async fn list(&self) -> Result<Vec<FaceSummary>, EngineError> {
        self.request(|reply| EngineRequest::List { reply }).await
    }

    /// Most recently published classification.
    pub async fn last(&self) -> Result<Option<Classification>, EngineError> {
        self.request(|reply| EngineRequest::Last { reply }).await
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// The thread owns the oracle and the session; it is the only writer of
/// the registered gallery.
pub fn spawn_engine(
    mut oracle: Box<dyn EmbeddingOracle + Send>,
    mut session: Session,
) -> Result<EngineHandle, EngineError> {
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);

    std::thread::Builder::new()
        .name("facematch-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Register { name, face, reply } => {
                        let result = run_register(oracle.as_mut(), &mut session, &name, &face);
                        let _ = reply.send(result);
                    }
                    EngineRequest::Identify { face, reply } => {
                        let result = pipeline::recognize(oracle.as_mut(), &face, &session)
                            .map_err(EngineError::from);
                        match &result {
                            Ok(classification) => session.publish(classification.clone()),
                            Err(err) => tracing::warn!(error = %err, "identify failed; no label produced"),
                        }
                        let _ = reply.send(result);
                    }
                    EngineRequest::List { reply } => {
                        let _ = reply.send(session.entries().iter().map(FaceSummary::from).collect());
                    }
                    EngineRequest::Last { reply } => {
                        let _ = reply.send(session.last().cloned());
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })?;

    Ok(EngineHandle { tx })
}

fn run_register(
    oracle: &mut dyn EmbeddingOracle,
    session: &mut Session,
    name: &str,
    face: &RgbImage,
) -> Result<FaceSummary, EngineError> {
    let embedding = pipeline::embed_face(oracle, face)?;
    let summary = FaceSummary::from(session.register(name, embedding)?);
    tracing::info!(name = %summary.name, entries = session.entries().len(), "face registered");
    Ok(summary)
}
