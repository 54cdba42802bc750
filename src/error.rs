use thiserror::Error;

/// Top-level error type for the Facemap crate.
#[derive(Debug, Error)]
pub enum FacemapError {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while validating an input triangle mesh.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("vertex buffer is empty")]
    EmptyVertices,

    #[error("vertex buffer length {0} is not a multiple of 3")]
    VertexBufferLength(usize),

    #[error("index buffer length {0} is not a multiple of 3")]
    IndexBufferLength(usize),

    #[error("index {index} at position {position} references vertex beyond count {vertex_count}")]
    IndexOutOfRange {
        position: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("normal buffer length {normals} does not match vertex buffer length {vertices}")]
    NormalBufferLength { normals: usize, vertices: usize },

    #[error("non-finite coordinate at buffer position {0}")]
    NonFinite(usize),

    #[error("triangle {0} does not exist")]
    TriangleNotFound(usize),

    #[error("no mesh is loaded at index {0}")]
    NotLoaded(u32),
}

/// Errors raised when a clustering strategy does not partition the triangles.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("cluster {0} is empty")]
    EmptyCluster(usize),

    #[error("cluster {cluster} references triangle {triangle} beyond count {triangle_count}")]
    TriangleOutOfRange {
        cluster: usize,
        triangle: usize,
        triangle_count: usize,
    },

    #[error("triangle {0} is in more than one cluster")]
    DuplicateTriangle(usize),

    #[error("triangle {0} is in no cluster")]
    MissingTriangle(usize),
}

/// Errors related to face selection and physical groups.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("group '{0}' is not registered")]
    UnknownGroup(String),

    #[error("group '{0}' is already registered")]
    DuplicateGroup(String),

    #[error("invalid group label '{0}': labels must be non-empty and contain no whitespace or path separators")]
    InvalidLabel(String),

    #[error("face {0} is not loaded")]
    UnknownFace(String),

    #[error("no active group is set")]
    NoActiveGroup,

    #[error("selection state is inconsistent: {0}")]
    Inconsistent(String),
}

/// Errors related to surface export and project storage.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata serialization failed: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("invalid project id '{0}'")]
    InvalidProjectId(String),

    #[error("project '{0}' not found")]
    ProjectNotFound(String),

    #[error("invalid file name '{0}'")]
    InvalidFileName(String),

    #[error("file '{file}' not found in project '{project}'")]
    FileNotFound { project: String, file: String },

    #[error("enclosure wall thickness {thickness} must be positive and less than {limit}")]
    WallThickness { thickness: f64, limit: f64 },
}

/// Errors related to loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Convenience type alias for results using [`FacemapError`].
pub type Result<T> = std::result::Result<T, FacemapError>;
