//! `GET /locations?q=<prefix>&limit=<n>&offset=<n>`

use std::sync::Arc;

use serde_json::Value;

use crate::db::{LocationStore, SearchOptions};
use crate::http::{HttpError, Reply, Request, RequestContext};
use crate::routes::RouteServices;
use crate::routing::RouteModule;

/// Fields returned for each matching location.
pub const SEARCH_FIELDS: [&str; 4] = ["geonameid", "name", "latitude", "longitude"];

pub fn module(services: &RouteServices) -> RouteModule {
    let store = services.locations.clone();
    RouteModule::new().get(move |request, context| search(store.clone(), request, context))
}

/// Search locations by ascii name prefix.
pub async fn search(
    store: Arc<dyn LocationStore>,
    request: Request,
    context: RequestContext,
) -> anyhow::Result<Reply> {
    let term = request
        .query("q")
        .ok_or_else(|| HttpError::bad_request("Invalid search query"))?;

    tracing::debug!(
        parent: context.logger().span(),
        "Searching for locations matching query \"{term}\""
    );
    let options = SearchOptions {
        fields: SEARCH_FIELDS.iter().map(|f| f.to_string()).collect(),
        limit: integer(request.query("limit")),
        offset: integer(request.query("offset")),
    };
    let locations = store.search(term, options).await?;

    Ok(Reply::json(Value::from(locations)))
}

/// Non-negative integers only; anything else is ignored.
fn integer(value: Option<&str>) -> Option<u32> {
    value?.parse().ok()
}
