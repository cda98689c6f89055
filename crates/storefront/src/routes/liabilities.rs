//! Liability route handlers.
//!
//! Debts are listed grouped by debtor name with each person's outstanding
//! balance. Marking a debt paid is the only way its status changes.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use tindahan_core::LiabilityId;
use tindahan_core::ledger::{self, DebtorGroup};
use tindahan_core::liability::{Liability, LiabilityDraft};

use super::{Chrome, Flash, redirect_error, redirect_success};
use crate::db::{LiabilityRepository, RepositoryError};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::state::AppState;

const INDEX_PATH: &str = "/liabilities";
const NEW_PATH: &str = "/liabilities/new";

/// Today in the store's time zone.
fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// =============================================================================
// Forms and views
// =============================================================================

/// Liability form data.
#[derive(Debug, Deserialize)]
pub struct LiabilityForm {
    pub debtor_name: String,
    pub amount: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
}

impl LiabilityForm {
    fn draft(&self) -> Result<LiabilityDraft, &'static str> {
        LiabilityDraft::from_form(
            &self.debtor_name,
            &self.amount,
            self.description.as_deref(),
            self.due_date.as_deref(),
        )
        .map_err(|e| e.code())
    }
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct LedgerParams {
    pub q: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Form-page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct FormParams {
    pub error: Option<String>,
}

/// One debt in a debtor's group.
#[derive(Clone)]
pub struct LiabilityView {
    pub id: i64,
    pub amount: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: &'static str,
    pub paid_date: Option<String>,
    pub is_paid: bool,
    pub overdue: bool,
}

impl LiabilityView {
    fn new(liability: &Liability, today: NaiveDate) -> Self {
        Self {
            id: liability.id.as_i64(),
            amount: liability.amount.to_string(),
            description: liability.description.clone(),
            due_date: liability.due_date.map(|d| d.to_string()),
            status: liability.status.label(),
            paid_date: liability.paid_date.map(|d| d.to_string()),
            is_paid: !liability.is_outstanding(),
            overdue: liability.is_overdue(today),
        }
    }
}

/// A debtor and their debts.
#[derive(Clone)]
pub struct DebtorView {
    pub debtor: String,
    pub outstanding: String,
    pub paid: String,
    pub settled: bool,
    pub items: Vec<LiabilityView>,
}

impl DebtorView {
    fn new(group: &DebtorGroup, today: NaiveDate) -> Self {
        Self {
            debtor: group.debtor.clone(),
            outstanding: group.outstanding_total().to_string(),
            paid: group.paid_total().to_string(),
            settled: group.is_settled(),
            items: group
                .items
                .iter()
                .map(|item| LiabilityView::new(item, today))
                .collect(),
        }
    }
}

/// Grouped liability listing template.
#[derive(Template, WebTemplate)]
#[template(path = "liabilities/index.html")]
pub struct LiabilitiesIndexTemplate {
    pub chrome: Chrome,
    pub flash: Flash,
    pub search: String,
    pub groups: Vec<DebtorView>,
    /// Liabilities before searching, to tell "none yet" from "no matches".
    pub total_liabilities: usize,
    pub outstanding_total: String,
}

/// Add/edit liability form template.
#[derive(Template, WebTemplate)]
#[template(path = "liabilities/form.html")]
pub struct LiabilityFormTemplate {
    pub chrome: Chrome,
    pub flash: Flash,
    pub heading: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub debtor_name: String,
    pub amount: String,
    pub description: String,
    pub due_date: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display liabilities grouped by debtor.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<LedgerParams>,
) -> impl IntoResponse {
    let mut error = params.error.clone();
    let liabilities = match LiabilityRepository::new(state.backend(), &user).list().await {
        Ok(liabilities) => liabilities,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load liabilities");
            error = Some("load_failed".to_string());
            Vec::new()
        }
    };
    let total_liabilities = liabilities.len();

    let search = params.q.clone().unwrap_or_default();
    let groups = ledger::group_by_debtor(ledger::filter_by_debtor(liabilities, &search));
    let today = today();

    LiabilitiesIndexTemplate {
        chrome: Chrome::liabilities(&user),
        flash: Flash::from_codes(error.as_deref(), params.success.as_deref()),
        outstanding_total: groups.outstanding_total().to_string(),
        groups: groups.iter().map(|group| DebtorView::new(group, today)).collect(),
        total_liabilities,
        search,
    }
}

/// Display the add liability form.
#[instrument(skip(user))]
pub async fn new_form(
    RequireAuth(user): RequireAuth,
    Query(params): Query<FormParams>,
) -> impl IntoResponse {
    LiabilityFormTemplate {
        chrome: Chrome::liabilities(&user),
        flash: Flash::from_codes(params.error.as_deref(), None),
        heading: "Add Liability",
        action: INDEX_PATH.to_string(),
        submit_label: "Add Liability",
        debtor_name: String::new(),
        amount: String::new(),
        description: String::new(),
        due_date: String::new(),
    }
}

/// Display the edit liability form.
#[instrument(skip(state, user))]
pub async fn edit_form(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i64>,
    Query(params): Query<FormParams>,
) -> Response {
    let liability = match LiabilityRepository::new(state.backend(), &user)
        .get(LiabilityId::new(id))
        .await
    {
        Ok(Some(liability)) => liability,
        Ok(None) => return redirect_error(INDEX_PATH, "not_found").into_response(),
        Err(e) => {
            tracing::error!(error = %e, liability_id = id, "Failed to load liability");
            return redirect_error(INDEX_PATH, "load_failed").into_response();
        }
    };

    LiabilityFormTemplate {
        chrome: Chrome::liabilities(&user),
        flash: Flash::from_codes(params.error.as_deref(), None),
        heading: "Edit Liability",
        action: format!("/liabilities/{id}"),
        submit_label: "Save Changes",
        debtor_name: liability.debtor_name,
        amount: liability.amount.plain(),
        description: liability.description.unwrap_or_default(),
        due_date: liability
            .due_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
    }
    .into_response()
}

/// Handle the add liability form.
#[instrument(skip(state, user))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<LiabilityForm>,
) -> Redirect {
    let draft = match form.draft() {
        Ok(draft) => draft,
        Err(code) => return redirect_error(NEW_PATH, code),
    };

    match LiabilityRepository::new(state.backend(), &user)
        .save(&draft, None)
        .await
    {
        Ok(liability) => {
            tracing::info!(liability_id = %liability.id, "Liability added");
            redirect_success(INDEX_PATH, "liability_added")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to add liability");
            redirect_error(NEW_PATH, "save_failed")
        }
    }
}

/// Handle the edit liability form.
#[instrument(skip(state, user))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i64>,
    Form(form): Form<LiabilityForm>,
) -> Redirect {
    let edit_path = format!("/liabilities/{id}/edit");
    let draft = match form.draft() {
        Ok(draft) => draft,
        Err(code) => return redirect_error(&edit_path, code),
    };

    match LiabilityRepository::new(state.backend(), &user)
        .save(&draft, Some(LiabilityId::new(id)))
        .await
    {
        Ok(_) => redirect_success(INDEX_PATH, "liability_updated"),
        Err(RepositoryError::NotFound) => redirect_error(INDEX_PATH, "not_found"),
        Err(e) => {
            tracing::error!(error = %e, liability_id = id, "Failed to update liability");
            redirect_error(&edit_path, "save_failed")
        }
    }
}

/// Mark a liability paid as of today.
#[instrument(skip(state, user))]
pub async fn mark_paid(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i64>,
) -> Redirect {
    match LiabilityRepository::new(state.backend(), &user)
        .mark_paid(LiabilityId::new(id), today())
        .await
    {
        Ok(_) => redirect_success(INDEX_PATH, "liability_paid"),
        Err(RepositoryError::NotFound) => redirect_error(INDEX_PATH, "not_found"),
        Err(e) => {
            tracing::error!(error = %e, liability_id = id, "Failed to mark liability paid");
            redirect_error(INDEX_PATH, "save_failed")
        }
    }
}

/// Delete a liability.
#[instrument(skip(state, user))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i64>,
) -> Redirect {
    match LiabilityRepository::new(state.backend(), &user)
        .delete(LiabilityId::new(id))
        .await
    {
        Ok(()) => redirect_success(INDEX_PATH, "liability_deleted"),
        Err(e) => {
            tracing::error!(error = %e, liability_id = id, "Failed to delete liability");
            redirect_error(INDEX_PATH, "delete_failed")
        }
    }
}
