use bzclient_core::CallInError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LuaBindingError {
    #[error("Lua runtime error: {0}")]
    Runtime(String),

    #[error("Binding error: {0}")]
    Binding(String),

    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<mlua::Error> for LuaBindingError {
    fn from(err: mlua::Error) -> Self {
        match err {
            mlua::Error::SerializeError(msg) | mlua::Error::DeserializeError(msg) => {
                LuaBindingError::Serialization(msg)
            }
            other => LuaBindingError::Runtime(other.to_string()),
        }
    }
}

impl From<LuaBindingError> for mlua::Error {
    fn from(err: LuaBindingError) -> Self {
        mlua::Error::external(err)
    }
}

impl From<LuaBindingError> for CallInError {
    fn from(err: LuaBindingError) -> Self {
        CallInError::Script(err.to_string())
    }
}

pub trait IntoAnyhow<T> {
    fn into_anyhow(self) -> anyhow::Result<T>;
}

impl<T> IntoAnyhow<T> for Result<T, mlua::Error> {
    fn into_anyhow(self) -> anyhow::Result<T> {
        self.map_err(|e| anyhow::anyhow!("{}", e))
    }
}

/// Lua error from a call-in, as the dispatcher reports it.
pub(crate) fn script_error(err: mlua::Error) -> CallInError {
    CallInError::Script(err.to_string())
}
