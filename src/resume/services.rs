use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::users::User;

const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];
const PRESIGN_TTL: Duration = Duration::from_secs(10 * 60);

pub struct ResumeUpload {
    pub filename: String,
    pub body: Bytes,
}

/// Lower-cased extension after the last dot, if any.
fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() && ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn allowed_extension(filename: &str) -> Option<String> {
    extension(filename).filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
}

fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Reduce a client-supplied name to a safe single path segment.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']);
    if cleaned.is_empty() {
        "resume".to_string()
    } else {
        cleaned.to_string()
    }
}

fn storage_key(user_id: Uuid, filename: &str) -> String {
    format!("resumes/{}/{}_{}", user_id, Uuid::new_v4(), sanitize_filename(filename))
}

/// Client-facing name of a stored resume: the sanitized upload name after the uuid prefix.
fn download_name(key: &str) -> &str {
    let object = key.rsplit('/').next().unwrap_or(key);
    match object.split_once('_') {
        Some((_, name)) if !name.is_empty() => name,
        _ => object,
    }
}

async fn remove_best_effort(state: &AppState, key: &str, user_id: Uuid) {
    match state.storage.delete_object(key).await {
        Ok(()) => info!(%user_id, key, "resume object removed"),
        Err(e) => warn!(%user_id, key, error = %e, "resume object removal failed; continuing"),
    }
}

/// Store a new resume and point the user at it. The previous object, if any,
/// is removed only after the reference has moved.
pub async fn upload(state: &AppState, user: &User, file: ResumeUpload) -> AppResult<User> {
    if file.filename.trim().is_empty() {
        return Err(AppError::validation("No selected file"));
    }
    let ext = allowed_extension(&file.filename).ok_or(AppError::InvalidFileType)?;

    let key = storage_key(user.id, &file.filename);
    state
        .storage
        .put_object(&key, file.body, content_type_for(&ext))
        .await
        .with_context(|| format!("put_object {}", key))?;

    let updated = match state.users.set_resume_key(user.id, Some(&key)).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            remove_best_effort(state, &key, user.id).await;
            return Err(AppError::NotFound("User not found".into()));
        }
        Err(e) => {
            remove_best_effort(state, &key, user.id).await;
            return Err(e);
        }
    };

    if let Some(previous) = user.resume_key.as_deref().filter(|p| *p != key) {
        remove_best_effort(state, previous, user.id).await;
    }

    info!(user_id = %user.id, key = %key, "resume uploaded");
    Ok(updated)
}

/// Clear the reference, then remove the object best-effort.
pub async fn delete(state: &AppState, user: &User) -> AppResult<User> {
    let Some(key) = user.resume_key.as_deref() else {
        return Err(AppError::NotFound("No resume to delete".into()));
    };

    let updated = state
        .users
        .set_resume_key(user.id, None)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    remove_best_effort(state, key, user.id).await;

    info!(user_id = %user.id, "resume deleted");
    Ok(updated)
}

pub async fn presigned_url(state: &AppState, user: &User) -> AppResult<String> {
    let key = user
        .resume_key
        .as_deref()
        .ok_or_else(|| AppError::NotFound("No resume uploaded".into()))?;
    let url = state
        .storage
        .presign_download(key, download_name(key), PRESIGN_TTL)
        .await
        .with_context(|| format!("presign url for {}", key))?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::memory::MemoryStorage;
    use crate::users::{memory::MemoryUserStore, NewUser, UserStore};

    async fn setup() -> (AppState, Arc<MemoryStorage>, User) {
        let users = Arc::new(MemoryUserStore::default());
        let storage = Arc::new(MemoryStorage::default());
        let state = AppState::fake_with(users.clone(), storage.clone());
        let user = users
            .create(NewUser {
                email: "a@b.com",
                password_hash: "hash",
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap();
        (state, storage, user)
    }

    fn file(name: &str) -> ResumeUpload {
        ResumeUpload {
            filename: name.into(),
            body: Bytes::from_static(b"%PDF-1.4"),
        }
    }

    #[test]
    fn extension_rules() {
        assert_eq!(allowed_extension("cv.pdf").as_deref(), Some("pdf"));
        assert_eq!(allowed_extension("CV.DOCX").as_deref(), Some("docx"));
        assert_eq!(allowed_extension("old.doc").as_deref(), Some("doc"));
        assert_eq!(allowed_extension("cv.exe"), None);
        assert_eq!(allowed_extension("pdf"), None);
        assert_eq!(allowed_extension("cv.pdf.sh"), None);
    }

    #[test]
    fn sanitize_strips_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\docs\\my cv.pdf"), "my_cv.pdf");
        assert_eq!(sanitize_filename(".hidden.pdf"), "hidden.pdf");
        assert_eq!(sanitize_filename("???"), "resume");
    }

    #[test]
    fn storage_keys_do_not_collide() {
        let id = Uuid::new_v4();
        let a = storage_key(id, "cv.pdf");
        let b = storage_key(id, "cv.pdf");
        assert_ne!(a, b);
        assert!(a.starts_with(&format!("resumes/{id}/")));
        assert!(a.ends_with("_cv.pdf"));
    }

    #[test]
    fn download_name_drops_uuid_prefix() {
        let key = storage_key(Uuid::new_v4(), "My CV.pdf");
        assert_eq!(download_name(&key), "My_CV.pdf");
        assert_eq!(download_name("resumes/x/legacy.pdf"), "legacy.pdf");
    }

    #[tokio::test]
    async fn rejects_disallowed_type() {
        let (state, storage, user) = setup().await;
        let err = upload(&state, &user, file("cv.txt")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFileType));
        assert_eq!(storage.len(), 0);
    }

    #[tokio::test]
    async fn second_upload_replaces_first() {
        let (state, storage, user) = setup().await;

        let first = upload(&state, &user, file("cv.pdf")).await.unwrap();
        let first_key = first.resume_key.clone().unwrap();
        assert!(storage.contains(&first_key));

        let second = upload(&state, &first, file("cv2.docx")).await.unwrap();
        let second_key = second.resume_key.clone().unwrap();
        assert_ne!(first_key, second_key);
        assert!(storage.contains(&second_key));
        assert!(!storage.contains(&first_key));

        let stored = state.users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.resume_key.as_deref(), Some(second_key.as_str()));
    }

    #[tokio::test]
    async fn storage_delete_failure_is_not_fatal() {
        let (state, storage, user) = setup().await;
        let first = upload(&state, &user, file("cv.pdf")).await.unwrap();

        storage.fail_deletes(true);
        let second = upload(&state, &first, file("cv.pdf")).await.unwrap();
        assert_ne!(second.resume_key, first.resume_key);

        let cleared = delete(&state, &second).await.unwrap();
        assert_eq!(cleared.resume_key, None);
    }

    #[tokio::test]
    async fn delete_without_resume_is_not_found() {
        let (state, _storage, user) = setup().await;
        let err = delete(&state, &user).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_object_and_reference() {
        let (state, storage, user) = setup().await;
        let uploaded = upload(&state, &user, file("cv.pdf")).await.unwrap();
        let key = uploaded.resume_key.clone().unwrap();

        let cleared = delete(&state, &uploaded).await.unwrap();
        assert_eq!(cleared.resume_key, None);
        assert!(!storage.contains(&key));
    }

    #[tokio::test]
    async fn failed_reference_clear_keeps_object() {
        let users = Arc::new(MemoryUserStore::default());
        let storage = Arc::new(MemoryStorage::default());
        let state = AppState::fake_with(users.clone(), storage.clone());
        let user = users
            .create(NewUser {
                email: "a@b.com",
                password_hash: "hash",
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap();
        let uploaded = upload(&state, &user, file("cv.pdf")).await.unwrap();
        let key = uploaded.resume_key.clone().unwrap();

        users.fail_resume_writes(true);
        assert!(delete(&state, &uploaded).await.is_err());

        let stored = users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.resume_key.as_deref(), Some(key.as_str()));
        assert!(storage.contains(&key));
    }

    #[tokio::test]
    async fn presign_points_at_current_resume() {
        let (state, _storage, user) = setup().await;
        assert!(matches!(
            presigned_url(&state, &user).await.unwrap_err(),
            AppError::NotFound(_)
        ));

        let uploaded = upload(&state, &user, file("cv.pdf")).await.unwrap();
        let url = presigned_url(&state, &uploaded).await.unwrap();
        assert!(url.contains(uploaded.resume_key.as_deref().unwrap()));
        assert!(url.contains("filename=cv.pdf"));
        assert!(url.contains("expires=600"));
    }
}
