//! 路由取值：封闭集合，LLM 输出只有落在其中才被接受

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dispatch::SpecialistKind;

/// 路由器可选的下一步
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Planner,
    Social,
    Platform,
    /// 成功结束：交给 Output Formatter
    FinalResponder,
    ErrorHandler,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Planner,
        Route::Social,
        Route::Platform,
        Route::FinalResponder,
        Route::ErrorHandler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Planner => "planner",
            Route::Social => "social",
            Route::Platform => "platform",
            Route::FinalResponder => "final_responder",
            Route::ErrorHandler => "error_handler",
        }
    }

    /// 若为专家路由，返回对应专家
    pub fn specialist(&self) -> Option<SpecialistKind> {
        match self {
            Route::Planner => Some(SpecialistKind::Planner),
            Route::Social => Some(SpecialistKind::Social),
            Route::Platform => Some(SpecialistKind::Platform),
            Route::FinalResponder | Route::ErrorHandler => None,
        }
    }

    /// 逗号分隔的合法取值，嵌入错误信息与 prompt
    pub fn valid_values() -> String {
        Route::ALL
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知路由值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRoute(pub String);

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRoute(s.to_string()))
    }
}
