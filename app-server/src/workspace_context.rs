use std::path::Path;
use std::path::PathBuf;

/// What the host knows about the active chat session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub cwd: Option<PathBuf>,
}

/// What the host knows about the open project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectContext {
    pub base_path: Option<PathBuf>,
}

/// Read-only view of the host state handed to every message handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceContext {
    pub session: Option<SessionContext>,
    pub project: Option<ProjectContext>,
}

impl WorkspaceContext {
    pub fn new(session: Option<SessionContext>, project: Option<ProjectContext>) -> Self {
        Self { session, project }
    }

    pub fn with_session_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.session = Some(SessionContext {
            cwd: Some(cwd.into()),
        });
        self
    }

    pub fn with_project_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.project = Some(ProjectContext {
            base_path: Some(base_path.into()),
        });
        self
    }

    /// The session's recorded directory wins; the project root is the
    /// fallback. Empty paths count as absent.
    pub fn resolve_working_directory(&self) -> Option<PathBuf> {
        let session_cwd = self
            .session
            .as_ref()
            .and_then(|session| non_empty(session.cwd.as_deref()));
        let project_root = || {
            self.project
                .as_ref()
                .and_then(|project| non_empty(project.base_path.as_deref()))
        };

        session_cwd.or_else(project_root).map(Path::to_path_buf)
    }
}

fn non_empty(path: Option<&Path>) -> Option<&Path> {
    path.filter(|candidate| !candidate.as_os_str().is_empty())
}
