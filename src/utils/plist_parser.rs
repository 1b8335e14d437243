use plist::Value;
use std::path::Path;

use crate::utils::{AppError, AppResult};

/// Location of the manifest inside an application bundle.
pub const INFO_PLIST: &str = "Contents/Info.plist";

pub fn read_info_plist(app_path: &Path) -> AppResult<plist::Dictionary> {
    let plist_path = app_path.join(INFO_PLIST);
    if !plist_path.is_file() {
        return Err(AppError::NotFound(plist_path.display().to_string()));
    }
    let val = Value::from_file(&plist_path)?;
    val.into_dictionary()
        .ok_or_else(|| AppError::Custom("Info.plist is not a dictionary".into()))
}

pub fn get_string(dict: &plist::Dictionary, key: &str) -> Option<String> {
    let s = dict.get(key)?.as_string()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
