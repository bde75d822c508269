//! HTTP front end.
//!
//! Everything is served from `/`: the `action` query parameter together with
//! the request method selects the operation, matching how the page forms
//! submit. Stored photos are served under the configured upload
//! prefix.

pub mod dispatch;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod render;


use std::sync::{Arc, Mutex};

use actix_web::{middleware, web, App, HttpServer};
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;
use crate::upload::UploadStore;

use dispatch::{action, ADD_DEPENDANT, CREATE_STAFF, EXPORT_CSV, LOG_VISIT};

/// Shared state handed to every handler.
///
/// One storage handle is opened at start-up and shared by all workers.
#[derive(Debug, Clone)]
pub struct AppState {
    storage: Arc<Mutex<Storage>>,
    uploads: UploadStore,
}

impl AppState {
    /// Wrap an open storage handle and the upload store.
    #[must_use]
    pub fn new(storage: Storage, uploads: UploadStore) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            uploads,
        }
    }

    /// The upload store.
    #[must_use]
    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    /// Run a storage operation on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns the operation's own error, or an internal error if the
    /// storage lock is poisoned or the blocking task fails.
    pub async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Storage) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        web::block(move || {
            let mut guard = storage
                .lock()
                .map_err(|_| Error::internal("storage lock poisoned"))?;
            op(&mut guard)
        })
        .await
        .map_err(|e| Error::internal(format!("blocking task failed: {e}")))?
    }
}

/// Register the routes and shared state on an app.
///
/// ```ignore
/// App::new().configure(wardbook::web::configure(state))
/// ```
pub fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let uploads_path = format!("/{}/{{file}}", state.uploads().url_prefix());

        cfg.app_data(web::Data::new(state))
            .service(
                web::resource("/")
                    .route(
                        web::post()
                            .guard(action(CREATE_STAFF))
                            .to(handlers::create_staff),
                    )
                    .route(
                        web::post()
                            .guard(action(ADD_DEPENDANT))
                            .to(handlers::add_dependant),
                    )
                    .route(web::post().guard(action(LOG_VISIT)).to(handlers::log_visit))
                    .route(web::get().guard(action(EXPORT_CSV)).to(handlers::export_csv))
                    .route(web::route().to(handlers::index)),
            )
            .route(&uploads_path, web::get().to(handlers::serve_upload));
    }
}

/// Run the HTTP server until it is shut down.
///
/// # Errors
///
/// Returns an error if the uploads directory cannot be created or the
/// listener cannot be bound.
pub async fn serve(config: &Config, storage: Storage) -> Result<()> {
    let uploads = UploadStore::from_config(config);
    uploads.ensure_directory()?;

    let state = AppState::new(storage, uploads);
    let (host, port) = config.bind_target();

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .configure(configure(state.clone()))
    });
    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }

    let server = server.bind((host.as_str(), port))?;
    info!("Listening on http://{}:{}", host, port);
    server.run().await?;

    info!("Server stopped");
    Ok(())
}
