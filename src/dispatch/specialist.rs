//! 专家抽象与专家集合
//!
//! 所有专家实现 Specialist trait（kind / invoke）；远程专家经 DispatchClient 走 HTTP，
//! 进程内专家（测试或嵌入部署）直接实现 trait 即可。SpecialistSet 为三个专家位各放一个实现。

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::SetupError;
use crate::dispatch::{DispatchClient, SpecialistKind, SpecialistResponse};

/// 专家 trait：调用失败也以 SpecialistResponse.error 返回，不抛错
#[async_trait]
pub trait Specialist: Send + Sync {
    fn kind(&self) -> SpecialistKind;

    async fn invoke(&self, task: &str, session_id: Option<&str>) -> SpecialistResponse;
}

/// 远程专家：共享一个 DispatchClient
pub struct RemoteSpecialist {
    kind: SpecialistKind,
    client: Arc<DispatchClient>,
}

impl RemoteSpecialist {
    pub fn new(kind: SpecialistKind, client: Arc<DispatchClient>) -> Self {
        Self { kind, client }
    }
}

#[async_trait]
impl Specialist for RemoteSpecialist {
    fn kind(&self) -> SpecialistKind {
        self.kind
    }

    async fn invoke(&self, task: &str, session_id: Option<&str>) -> SpecialistResponse {
        self.client.invoke(self.kind, task, session_id).await
    }
}

/// 三个专家位：planner / social / platform
#[derive(Clone)]
pub struct SpecialistSet {
    planner: Arc<dyn Specialist>,
    social: Arc<dyn Specialist>,
    platform: Arc<dyn Specialist>,
}

impl SpecialistSet {
    /// 每个位置的实现必须与其 kind 一致
    pub fn new(
        planner: Arc<dyn Specialist>,
        social: Arc<dyn Specialist>,
        platform: Arc<dyn Specialist>,
    ) -> Result<Self, SetupError> {
        let set = Self {
            planner,
            social,
            platform,
        };
        for kind in SpecialistKind::ALL {
            let actual = set.get(kind).kind();
            if actual != kind {
                return Err(SetupError::InvalidConfig(format!(
                    "specialist in slot '{kind}' reports kind '{actual}'"
                )));
            }
        }
        Ok(set)
    }

    /// 全部走 HTTP
    pub fn remote(client: Arc<DispatchClient>) -> Self {
        Self {
            planner: Arc::new(RemoteSpecialist::new(SpecialistKind::Planner, client.clone())),
            social: Arc::new(RemoteSpecialist::new(SpecialistKind::Social, client.clone())),
            platform: Arc::new(RemoteSpecialist::new(SpecialistKind::Platform, client)),
        }
    }

    /// 按实现自身的 kind 替换对应位置
    pub fn with(mut self, specialist: Arc<dyn Specialist>) -> Self {
        match specialist.kind() {
            SpecialistKind::Planner => self.planner = specialist,
            SpecialistKind::Social => self.social = specialist,
            SpecialistKind::Platform => self.platform = specialist,
        }
        self
    }

    pub fn get(&self, kind: SpecialistKind) -> &Arc<dyn Specialist> {
        match kind {
            SpecialistKind::Planner => &self.planner,
            SpecialistKind::Social => &self.social,
            SpecialistKind::Platform => &self.platform,
        }
    }
}
