//! Snippet Handlers

use axum::Form;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use auth::RequestContext;
use kernel::error::domain::DomainError;
use kernel::id::SnippetId;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{SnippetError, SnippetResult};
use crate::snippets::dto::SnippetCreateForm;
use crate::snippets::entity::Snippet;
use crate::snippets::repository::{LATEST_LIMIT, SnippetRepository};

#[derive(Clone)]
pub struct SnippetState<R>
where
    R: SnippetRepository + Clone + Send + Sync + 'static,
{
    pub snippets: Arc<R>,
}

#[derive(Serialize)]
struct HomePage {
    snippets: Vec<Snippet>,
}

#[derive(Serialize)]
struct ViewPage {
    snippet: Snippet,
}

/// GET /
pub async fn home<R>(
    State(state): State<SnippetState<R>>,
    ctx: RequestContext,
) -> SnippetResult<Response>
where
    R: SnippetRepository + Clone + Send + Sync + 'static,
{
    let snippets = state.snippets.latest(LATEST_LIMIT).await?;

    Ok(ctx
        .template_data()
        .with_page(HomePage { snippets })
        .render(StatusCode::OK))
}

/// GET /snippet/view/{id}
pub async fn snippet_view<R>(
    State(state): State<SnippetState<R>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> SnippetResult<Response>
where
    R: SnippetRepository + Clone + Send + Sync + 'static,
{
    let id: SnippetId = id
        .parse()
        .map_err(|_| SnippetError::from(DomainError::NoRecord))?;
    let snippet = state.snippets.get(&id).await?;

    Ok(ctx
        .template_data()
        .with_page(ViewPage { snippet })
        .render(StatusCode::OK))
}

/// GET /snippet/create
pub async fn snippet_create_form(ctx: RequestContext) -> Response {
    ctx.form_data()
        .with_form(&SnippetCreateForm::default(), Default::default())
        .render(StatusCode::OK)
}

/// POST /snippet/create
pub async fn snippet_create<R>(
    State(state): State<SnippetState<R>>,
    ctx: RequestContext,
    Form(form): Form<SnippetCreateForm>,
) -> SnippetResult<Response>
where
    R: SnippetRepository + Clone + Send + Sync + 'static,
{
    let new = match form.validate() {
        Ok(new) => new,
        Err(errors) => {
            return Ok(ctx
                .form_data()
                .with_form(&form, errors)
                .render(StatusCode::UNPROCESSABLE_ENTITY));
        }
    };

    let id = state.snippets.insert(&new).await?;
    tracing::info!(snippet_id = %id, "Snippet created");

    ctx.session.put_flash("Snippet successfully created!");
    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}
