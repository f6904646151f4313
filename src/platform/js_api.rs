//! Score service backed by a host-page JS object
//!
//! The object provides `currentUser()`, `submitScore(score)` and
//! `getLeaderboard()`. The latter two may return plain values or promises.

use js_sys::{Function, JSON, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::leaderboard::{LeaderboardEntry, LocalFuture, ScoreService, ServiceError};

pub struct JsScoreService {
    api: JsValue,
}

impl JsScoreService {
    pub fn new(api: JsValue) -> Self {
        Self { api }
    }
}

fn describe(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", err))
}

fn method(api: &JsValue, name: &str) -> Result<Function, ServiceError> {
    Reflect::get(api, &JsValue::from_str(name))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
        .ok_or_else(|| ServiceError::Malformed(format!("score API has no {}()", name)))
}

/// Call `name` with `args` and await the result if it is a promise
async fn call(api: JsValue, name: &'static str, arg: Option<JsValue>) -> Result<JsValue, ServiceError> {
    let f = method(&api, name)?;
    let value = match arg {
        Some(arg) => f.call1(&api, &arg),
        None => f.call0(&api),
    }
    .map_err(|e| ServiceError::Network(describe(&e)))?;
    JsFuture::from(Promise::resolve(&value))
        .await
        .map_err(|e| ServiceError::Network(describe(&e)))
}

impl ScoreService for JsScoreService {
    fn current_player(&self) -> Option<String> {
        let user = method(&self.api, "currentUser").ok()?.call0(&self.api).ok()?;
        if user.is_null() || user.is_undefined() {
            return None;
        }
        if let Some(name) = user.as_string() {
            return Some(name);
        }
        ["displayName", "name"].iter().find_map(|key| {
            Reflect::get(&user, &JsValue::from_str(key))
                .ok()
                .and_then(|v| v.as_string())
        })
    }

    fn submit_score(&self, score: u32) -> LocalFuture<Result<(), ServiceError>> {
        let api = self.api.clone();
        Box::pin(async move {
            let result = call(api, "submitScore", Some(JsValue::from(score))).await?;
            if result.as_bool() == Some(false) {
                return Err(ServiceError::Rejected);
            }
            Ok(())
        })
    }

    fn fetch_leaderboard(&self) -> LocalFuture<Result<Vec<LeaderboardEntry>, ServiceError>> {
        let api = self.api.clone();
        Box::pin(async move {
            let value = call(api, "getLeaderboard", None).await?;
            if value.is_null() || value.is_undefined() {
                return Err(ServiceError::Network("no leaderboard returned".into()));
            }
            let json = JSON::stringify(&value)
                .ok()
                .and_then(|s| s.as_string())
                .ok_or_else(|| ServiceError::Malformed("leaderboard is not JSON".into()))?;
            serde_json::from_str::<Vec<LeaderboardEntry>>(&json)
                .map_err(|e| ServiceError::Malformed(e.to_string()))
        })
    }
}
