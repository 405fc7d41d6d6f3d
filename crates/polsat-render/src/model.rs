#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableVerdict {
    Authorized,
    Forbidden,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableClause {
    pub fact: String,
    pub requirement: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableFact {
    pub fact: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableRequest {
    pub name: String,
    pub rules: Vec<String>,
    pub must_fetch: bool,
    pub strict_check_only: bool,
    pub dependencies: Vec<String>,
    pub fetched: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableError {
    pub code: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableReport {
    pub verdict: RenderableVerdict,
    pub strict_access: bool,
    pub scenarios: Vec<Vec<RenderableClause>>,
    /// Sentinel facts are expected to be filtered out already.
    pub facts: Vec<RenderableFact>,
    pub requests: Vec<RenderableRequest>,
    pub error: Option<RenderableError>,
}
