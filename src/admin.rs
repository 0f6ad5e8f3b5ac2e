// File: src/admin.rs
//! Admin dashboard: authenticated CRUD over events, officers and gallery.
//!
//! Mutations never touch the local list directly. A confirmed success closes
//! the form and refetches; a failure leaves the form exactly as it was so the
//! admin can correct it and retry.
use crate::client::{ApiClient, ApiError};
use crate::model::{Event, GalleryImage, Officer, Resource};
use crate::session::{RouteGate, SessionManager};
use crate::storage::{LocalStorage, TOKEN_KEY};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("not signed in")]
    NotAuthenticated,
    #[error("no form is open")]
    NoOpenForm,
    #[error("{0} records cannot be edited")]
    Unsupported(&'static str),
    #[error("no {noun} with id '{id}'")]
    NotFound { noun: &'static str, id: String },
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AdminError {
    /// Backend detail or local validation message when available, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AdminError::Api(e) => e.user_message(fallback),
            AdminError::Invalid(msg) => msg.clone(),
            AdminError::NotAuthenticated => "Please sign in again".to_string(),
            _ => fallback.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Form<D> {
    pub mode: FormMode,
    pub draft: D,
}

/// CRUD surface for one record type.
#[derive(Debug)]
pub struct AdminPanel<R: Resource> {
    client: ApiClient,
    storage: LocalStorage,
    items: Vec<R>,
    form: Option<Form<R::Draft>>,
}

impl<R: Resource> AdminPanel<R> {
    pub fn new(client: ApiClient, storage: LocalStorage) -> Self {
        Self {
            client,
            storage,
            items: Vec::new(),
            form: None,
        }
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    /// Refetches the list. On failure the current list is kept.
    pub async fn refresh(&mut self) -> Result<(), AdminError> {
        match self.client.list::<R>().await {
            Ok(items) => {
                self.items = items;
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to fetch {} list: {}", R::NOUN, e);
                Err(e.into())
            }
        }
    }

    pub fn open_create(&mut self) -> &mut R::Draft {
        let draft = R::blank_draft(&self.items);
        &mut self
            .form
            .insert(Form {
                mode: FormMode::Create,
                draft,
            })
            .draft
    }

    pub fn open_edit(&mut self, id: &str) -> Result<&mut R::Draft, AdminError> {
        if !R::UPDATABLE {
            return Err(AdminError::Unsupported(R::NOUN));
        }
        let draft = self
            .items
            .iter()
            .find(|item| item.id() == id)
            .map(R::to_draft)
            .ok_or_else(|| AdminError::NotFound {
                noun: R::NOUN,
                id: id.to_string(),
            })?;
        Ok(&mut self
            .form
            .insert(Form {
                mode: FormMode::Edit(id.to_string()),
                draft,
            })
            .draft)
    }

    pub fn form(&self) -> Option<&Form<R::Draft>> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut R::Draft> {
        self.form.as_mut().map(|f| &mut f.draft)
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    /// Sends the open form as a create or update.
    pub async fn submit(&mut self) -> Result<R, AdminError> {
        let form = self.form.as_ref().ok_or(AdminError::NoOpenForm)?;
        R::validate(&form.draft).map_err(AdminError::Invalid)?;
        let token = self.token()?;

        let saved = match &form.mode {
            FormMode::Create => self.client.create::<R>(&token, &form.draft).await?,
            FormMode::Edit(id) => self.client.update::<R>(&token, id, &form.draft).await?,
        };
        log::info!("Saved {} '{}'", R::NOUN, saved.id());

        self.form = None;
        self.refresh_after_mutation().await;
        Ok(saved)
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), AdminError> {
        let token = self.token()?;
        self.client.delete::<R>(&token, id).await?;
        log::info!("Deleted {} '{}'", R::NOUN, id);
        self.refresh_after_mutation().await;
        Ok(())
    }

    pub fn save_fallback() -> String {
        if R::UPDATABLE {
            format!("Failed to save {}", R::NOUN)
        } else {
            format!("Failed to add {}", R::NOUN)
        }
    }

    pub fn delete_fallback() -> String {
        format!("Failed to delete {}", R::NOUN)
    }

    // The mutation already succeeded; a failed refetch only leaves the list stale.
    async fn refresh_after_mutation(&mut self) {
        let _ = self.refresh().await;
    }

    fn token(&self) -> Result<String, AdminError> {
        match self.storage.get_item(TOKEN_KEY) {
            Ok(Some(token)) if !token.trim().is_empty() => Ok(token),
            Ok(_) => Err(AdminError::NotAuthenticated),
            Err(e) => {
                log::warn!("Could not read stored token: {:#}", e);
                Err(AdminError::NotAuthenticated)
            }
        }
    }
}

/// The three panels behind the authenticated admin route.
#[derive(Debug)]
pub struct AdminDashboard {
    pub events: AdminPanel<Event>,
    pub officers: AdminPanel<Officer>,
    pub gallery: AdminPanel<GalleryImage>,
}

impl AdminDashboard {
    /// Builds the dashboard when the session allows it, otherwise returns the gate.
    pub fn open(session: &SessionManager, client: &ApiClient) -> Result<Self, RouteGate> {
        match session.gate_admin() {
            RouteGate::Allowed => {
                let storage = session.storage().clone();
                Ok(Self {
                    events: AdminPanel::new(client.clone(), storage.clone()),
                    officers: AdminPanel::new(client.clone(), storage.clone()),
                    gallery: AdminPanel::new(client.clone(), storage),
                })
            }
            gate => Err(gate),
        }
    }

    /// Loads every panel. All three are attempted; the first failure is returned.
    pub async fn refresh_all(&mut self) -> Result<(), AdminError> {
        let (events, officers, gallery) = futures::join!(
            self.events.refresh(),
            self.officers.refresh(),
            self.gallery.refresh()
        );
        events.and(officers).and(gallery)
    }
}
