use crate::ipc::error::ok;
use crate::ipc::helpers::{get_optional_i64, parse_param, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::listing::{filter_by_search, paginate, BankItem};
use serde_json::json;

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 200;

fn positive_usize(v: Option<i64>, key: &str, default: usize) -> Result<usize, HandlerErr> {
    match v {
        None => Ok(default),
        Some(n) if n >= 1 => Ok(n as usize),
        Some(n) => Err(HandlerErr::bad_params(format!("{} must be >= 1", key)).with_details(json!({ key: n }))),
    }
}

fn handle_query(_state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let items = parse_param::<Vec<BankItem>>(&req.params, "items")?
        .ok_or_else(|| HandlerErr::bad_params("missing items"))?;
    let search = match req.params.get("search") {
        None | Some(serde_json::Value::Null) => "",
        Some(serde_json::Value::String(s)) => s.as_str(),
        Some(other) => {
            return Err(HandlerErr::bad_params("search must be a string")
                .with_details(json!({ "search": other })))
        }
    };
    let page = positive_usize(get_optional_i64(&req.params, "page")?, "page", 1)?;
    let page_size = positive_usize(
        get_optional_i64(&req.params, "pageSize")?,
        "pageSize",
        DEFAULT_PAGE_SIZE,
    )?
    .min(MAX_PAGE_SIZE);

    let hits: Vec<BankItem> = filter_by_search(&items, search).into_iter().cloned().collect();
    let page = paginate(&hits, page, page_size);
    Ok(json!(page))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "bank.query" => Some(match handle_query(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        _ => None,
    }
}
