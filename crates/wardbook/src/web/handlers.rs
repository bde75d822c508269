//! Request handlers.

use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::MultipartForm;
use actix_web::http::header::{self, ContentType};
use actix_web::{web, HttpResponse};
use chrono::Local;
use tracing::{debug, info};
use url::form_urlencoded;

use super::dispatch::VIEW_STAFF;
use super::forms::{DependantForm, PageQuery, StaffForm, VisitForm};
use super::render::{DetailPanel, IndexPage};
use super::AppState;
use crate::error::{Error, Result};
use crate::export::{export_file_name, staff_csv};
use crate::records::{today, DependantAdded};
use crate::upload::UploadStore;

/// Notice shown when a dependant is rejected by the cap.
pub const LIMIT_REACHED_NOTICE: &str = "Max dependants reached";

/// `/?action=view_staff&<key>=<value>[&error=<notice>]`
fn detail_location(key: &str, value: &str, notice: Option<&str>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("action", VIEW_STAFF).append_pair(key, value);
    if let Some(notice) = notice {
        query.append_pair("error", notice);
    }
    format!("/?{}", query.finish())
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Move an uploaded photo into the store off the async executor.
async fn store_photo(uploads: &UploadStore, photo: Option<TempFile>) -> Result<Option<String>> {
    let Some(photo) = photo else {
        return Ok(None);
    };
    let uploads = uploads.clone();
    web::block(move || uploads.store(photo.file.path(), photo.file_name.as_deref(), photo.size))
        .await
        .map_err(|e| Error::internal(format!("upload task failed: {e}")))?
}

/// `GET /`: listing, dashboard and the optional detail panel.
///
/// # Errors
///
/// Returns an error if the storage reads fail.
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let search = query.search_term().to_string();
    let key = query.staff_key();

    let (staff, stats, detail) = state
        .run(move |storage| {
            let staff = storage.search_staff(&search)?;
            let stats = storage.statistics()?;
            let detail = key.map(|key| storage.staff_detail(&key)).transpose()?;
            Ok((staff, stats, detail))
        })
        .await?;

    let panel = match &detail {
        None => DetailPanel::Hidden,
        Some(None) => DetailPanel::NotFound,
        Some(Some(found)) => DetailPanel::Staff(found),
    };
    let page = IndexPage {
        search: query.search_term(),
        notice: query.error.as_deref().filter(|e| !e.is_empty()),
        staff: &staff,
        stats: &stats,
        detail: panel,
        today: today(),
    };

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(page.to_string()))
}

/// `POST /?action=create_staff`
///
/// # Errors
///
/// Returns an error if a required field is empty or storage fails.
pub async fn create_staff(
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<StaffForm>,
) -> Result<HttpResponse> {
    let (mut staff, photo) = form.into_parts();
    staff.validate()?;
    staff.photo = store_photo(state.uploads(), photo).await?;

    let hospital_number = staff.hospital_number.clone();
    state.run(move |storage| storage.upsert_staff(&staff)).await?;

    Ok(see_other(&detail_location(
        "hospital_number",
        &hospital_number,
        None,
    )))
}

/// `POST /?action=add_dependant`
///
/// A rejection by the cap redirects back with a notice rather than failing.
///
/// # Errors
///
/// Returns an error if the staff id is malformed or unknown, or storage fails.
pub async fn add_dependant(
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<DependantForm>,
) -> Result<HttpResponse> {
    let (staff_id, mut dependant, photo) = form.into_parts()?;
    dependant.photo = store_photo(state.uploads(), photo).await?;
    let stored_photo = dependant.photo.clone();

    let added = state
        .run(move |storage| storage.add_dependant(staff_id, &dependant))
        .await;

    let notice = match added {
        Ok(DependantAdded::Added(id)) => {
            info!("Added dependant {} to staff {}", id, staff_id);
            None
        }
        Ok(DependantAdded::LimitReached) => {
            if let Some(path) = &stored_photo {
                state.uploads().discard(path);
            }
            Some(LIMIT_REACHED_NOTICE)
        }
        Err(e) => {
            if let Some(path) = &stored_photo {
                state.uploads().discard(path);
            }
            return Err(e);
        }
    };

    Ok(see_other(&detail_location(
        "id",
        &staff_id.to_string(),
        notice,
    )))
}

/// `POST /?action=log_visit`
///
/// # Errors
///
/// Returns an error if the form is malformed, the staff record is unknown,
/// or storage fails.
pub async fn log_visit(
    state: web::Data<AppState>,
    form: web::Form<VisitForm>,
) -> Result<HttpResponse> {
    let (staff_id, visit) = form.into_inner().into_new_visit()?;
    let id = state
        .run(move |storage| storage.log_visit(staff_id, &visit))
        .await?;
    info!("Logged visit {} for staff {}", id, staff_id);

    Ok(see_other(&detail_location(
        "id",
        &staff_id.to_string(),
        None,
    )))
}

/// `GET /?action=export_csv`
///
/// # Errors
///
/// Returns an error if storage fails.
pub async fn export_csv(state: web::Data<AppState>) -> Result<HttpResponse> {
    let csv = state.run(|storage| staff_csv(storage)).await?;
    let file_name = export_file_name(&Local::now());

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ))
        .body(csv))
}

/// `GET /<prefix>/<file>`: a stored photo.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub async fn serve_upload(
    state: web::Data<AppState>,
    file: web::Path<String>,
) -> Result<HttpResponse> {
    let file = file.into_inner();
    let Some(path) = state.uploads().resolve(&file) else {
        debug!("Rejected upload path {}", file);
        return Ok(HttpResponse::NotFound().finish());
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(HttpResponse::Ok()
            .content_type(content_type_for(&file))
            .body(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(HttpResponse::NotFound().finish())
        }
        Err(e) => Err(e.into()),
    }
}

fn content_type_for(file: &str) -> &'static str {
    let extension = file
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_location_by_number() {
        assert_eq!(
            detail_location("hospital_number", "HN 1/A", None),
            "/?action=view_staff&hospital_number=HN+1%2FA"
        );
    }

    #[test]
    fn test_detail_location_with_notice() {
        assert_eq!(
            detail_location("id", "7", Some(LIMIT_REACHED_NOTICE)),
            "/?action=view_staff&id=7&error=Max+dependants+reached"
        );
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("1_a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("1_a.png"), "image/png");
        assert_eq!(content_type_for("1_noext"), "application/octet-stream");
    }
}
