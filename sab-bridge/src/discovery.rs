//! Capture-software discovery
//!
//! Answers three questions without side effects: is the capture software
//! installed, is it running, and where are its exported measurement files.
//! Absence is never an error here. Only I/O failures on paths that do exist
//! (permissions, broken mounts) are reported, and those are logged and
//! carried alongside the result rather than aborting the probe.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::parsers::FileFormat;

/// File extensions treated as measurement exports
const MEASUREMENT_EXTENSIONS: [&str; 5] = ["txt", "csv", "smaart", "measurement", "dat"];

/// Case-insensitive product marker in process names and file names
const PRODUCT_MARKER: &str = "smaart";

/// Discovery I/O failures distinct from "not found"
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Path exists but could not be inspected
    #[error("cannot access {path}: {source}")]
    Access { path: PathBuf, source: io::Error },

    /// Process listing command could not be run
    #[error("process listing failed: {0}")]
    ProcessProbe(String),
}

/// Coarse product label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProductVariant {
    #[serde(rename = "Smaart Suite")]
    SmaartSuite,
    #[serde(rename = "Smaart v9")]
    SmaartV9,
    #[serde(rename = "Smaart")]
    Smaart,
}

impl ProductVariant {
    /// Most specific label whose name appears in `text`
    pub fn detect(text: &str) -> Self {
        if text.contains("Smaart Suite") {
            ProductVariant::SmaartSuite
        } else if text.contains("Smaart v9") {
            ProductVariant::SmaartV9
        } else {
            ProductVariant::Smaart
        }
    }
}

/// Where an installation was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "foundBy")]
pub enum InstallationInfo {
    /// An executable exists at a conventional install path
    #[serde(rename = "installPath")]
    InstallPath {
        path: PathBuf,
        variant: ProductVariant,
    },
    /// No install path matched, but the product is running
    #[serde(rename = "runningProcess")]
    RunningProcess { process: ProcessInfo },
}

/// Matching entry from the OS process list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInfo {
    /// PID of the first matching process, when the listing carries one
    pub pid: Option<u32>,
    pub variant: ProductVariant,
    /// Command line (or image name) of the first match
    pub command: String,
    /// Number of matching processes
    pub count: usize,
}

/// Candidate measurement file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRef {
    pub name: String,
    pub path: PathBuf,
    pub format: FileFormat,
    /// Extension without the dot, empty when absent
    #[serde(rename = "type")]
    pub extension: String,
}

impl FileRef {
    fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let format = FileFormat::from_path(&path);
        Self {
            name,
            path,
            format,
            extension,
        }
    }
}

/// Result of a data-directory scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileScan {
    /// Matching files of the first directory that had any, sorted by name
    pub files: Vec<FileRef>,
    /// Directory the files came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Access failures on existing directories, in search order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// True for names the capture software exports measurements under
pub fn is_measurement_file(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    let by_extension = Path::new(&lowered)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| MEASUREMENT_EXTENSIONS.contains(&ext));
    by_extension || lowered.contains(PRODUCT_MARKER)
}

/// Ordered search paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryPaths {
    /// Executables probed by [`Discovery::detect_installation`]
    pub install_paths: Vec<PathBuf>,
    /// Directories searched for measurement exports, first match wins
    pub data_dirs: Vec<PathBuf>,
    /// Directory reported as the data path
    pub primary_data_path: PathBuf,
}

impl DiscoveryPaths {
    /// Conventional locations for the running platform
    pub fn for_current_platform() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let documents = dirs::document_dir().unwrap_or_else(|| home.join("Documents"));
        let desktop = dirs::desktop_dir().unwrap_or_else(|| home.join("Desktop"));

        let install_paths: Vec<PathBuf> = if cfg!(target_os = "windows") {
            vec![
                PathBuf::from(r"C:\Program Files\Rational Acoustics\Smaart v9\Smaart v9.exe"),
                PathBuf::from(r"C:\Program Files (x86)\Rational Acoustics\Smaart v9\Smaart v9.exe"),
            ]
        } else if cfg!(target_os = "macos") {
            vec![
                PathBuf::from("/Applications/Smaart Suite.app/Contents/MacOS/Smaart Suite"),
                PathBuf::from("/Applications/Smaart v9.app/Contents/MacOS/Smaart v9"),
                PathBuf::from("/Applications/Smaart v9/Smaart v9.app/Contents/MacOS/Smaart v9"),
            ]
        } else {
            vec![
                PathBuf::from("/opt/smaart9/bin/smaart9"),
                PathBuf::from("/usr/local/bin/smaart9"),
            ]
        };

        let data_dirs: Vec<PathBuf> = if cfg!(target_os = "windows") {
            let app_data = dirs::config_dir().unwrap_or_else(|| home.join("AppData").join("Roaming"));
            vec![
                app_data.join("Rational Acoustics").join("Smaart v9"),
                documents.join("Smaart"),
                desktop.join("Smaart"),
            ]
        } else if cfg!(target_os = "macos") {
            let support = home.join("Library").join("Application Support");
            vec![
                support.join("Rational Acoustics").join("Smaart v9"),
                support.join("Rational Acoustics").join("Smaart Suite"),
                support.join("Smaart Suite"),
                documents.join("Smaart"),
                desktop.join("Smaart"),
                home.join(".smaart9"),
                home.join("Library").join("Preferences"),
            ]
        } else {
            let config = dirs::config_dir().unwrap_or_else(|| home.join(".config"));
            vec![
                config.join("smaart9"),
                home.join(".smaart9"),
                documents.join("Smaart"),
                desktop.join("Smaart"),
            ]
        };

        let primary_data_path = data_dirs[0].clone();
        Self {
            install_paths,
            data_dirs,
            primary_data_path,
        }
    }

    /// Search only `dir` for measurement files
    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.primary_data_path = dir.clone();
        self.data_dirs = vec![dir];
        self
    }
}

/// Source of the OS process list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessListing {
    /// Run `ps` (Unix) or `tasklist` (Windows)
    System,
    /// Fixed listing text, for hosts without a process table
    Fixed(String),
}

/// Parse `ps -eo pid=,args=` or `tasklist /FO CSV /NH` output
///
/// Returns the first line mentioning the product, case-insensitively,
/// with the number of matching lines.
pub fn parse_process_listing(listing: &str) -> Option<ProcessInfo> {
    let matches: Vec<&str> = listing
        .lines()
        .map(str::trim)
        .filter(|line| line.to_ascii_lowercase().contains(PRODUCT_MARKER))
        .collect();
    let first = *matches.first()?;

    let (pid, command) = if first.starts_with('"') {
        // "Image Name","PID","Session Name","Session#","Mem Usage"
        let fields: Vec<&str> = first.trim_matches('"').split("\",\"").collect();
        let name = fields.first().copied().unwrap_or(first);
        let pid = fields.get(1).and_then(|p| p.parse().ok());
        (pid, name.to_string())
    } else {
        match first.split_once(char::is_whitespace) {
            Some((pid, rest)) => match pid.parse() {
                Ok(pid) => (Some(pid), rest.trim().to_string()),
                Err(_) => (None, first.to_string()),
            },
            None => (first.parse().ok(), first.to_string()),
        }
    };

    Some(ProcessInfo {
        pid,
        variant: ProductVariant::detect(&command),
        command,
        count: matches.len(),
    })
}

/// Installation, process and file discovery
#[derive(Debug, Clone)]
pub struct Discovery {
    paths: DiscoveryPaths,
    processes: ProcessListing,
}

impl Discovery {
    pub fn new(paths: DiscoveryPaths, processes: ProcessListing) -> Self {
        Self { paths, processes }
    }

    pub fn paths(&self) -> &DiscoveryPaths {
        &self.paths
    }

    /// Directory reported as the data path
    pub fn data_path(&self) -> &Path {
        &self.paths.primary_data_path
    }

    /// Whether the data path exists and can be inspected
    pub async fn data_path_accessible(&self) -> bool {
        tokio::fs::metadata(&self.paths.primary_data_path).await.is_ok()
    }

    /// First existing install path, else a running process
    pub async fn detect_installation(&self) -> Option<InstallationInfo> {
        for path in &self.paths.install_paths {
            match tokio::fs::metadata(path).await {
                Ok(_) => {
                    let variant = ProductVariant::detect(&path.to_string_lossy());
                    return Some(InstallationInfo::InstallPath {
                        path: path.clone(),
                        variant,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    let err = DiscoveryError::Access {
                        path: path.clone(),
                        source,
                    };
                    warn!("Install probe: {}", err);
                }
            }
        }

        self.detect_running_process()
            .await
            .map(|process| InstallationInfo::RunningProcess { process })
    }

    /// First running process whose name mentions the product
    pub async fn detect_running_process(&self) -> Option<ProcessInfo> {
        let listing = match &self.processes {
            ProcessListing::Fixed(text) => text.clone(),
            ProcessListing::System => match system_process_listing().await {
                Ok(text) => text,
                Err(e) => {
                    warn!("{}", e);
                    return None;
                }
            },
        };
        parse_process_listing(&listing)
    }

    /// Measurement files of the first data directory that has any
    pub async fn list_measurement_files(&self) -> FileScan {
        let mut scan = FileScan::default();

        for dir in &self.paths.data_dirs {
            match measurement_files_in(dir).await {
                Ok(files) if files.is_empty() => {
                    debug!("No measurement files in {}", dir.display());
                }
                Ok(files) => {
                    debug!("Found {} measurement files in {}", files.len(), dir.display());
                    scan.files = files;
                    scan.directory = Some(dir.clone());
                    return scan;
                }
                Err(DiscoveryError::Access { source, .. })
                    if source.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Skipping data directory: {}", e);
                    scan.errors.push(e.to_string());
                }
            }
        }

        scan
    }
}

async fn measurement_files_in(dir: &Path) -> Result<Vec<FileRef>, DiscoveryError> {
    let access = |source| DiscoveryError::Access {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(access)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(access)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_measurement_file(&name) {
            continue;
        }
        match entry.file_type().await {
            Ok(file_type) if file_type.is_dir() => continue,
            Ok(_) => files.push(FileRef::new(entry.path())),
            Err(e) => debug!("Cannot stat {}: {}", name, e),
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

async fn system_process_listing() -> Result<String, DiscoveryError> {
    let output = if cfg!(target_os = "windows") {
        tokio::process::Command::new("tasklist")
            .args(["/FO", "CSV", "/NH"])
            .output()
            .await
    } else {
        tokio::process::Command::new("ps")
            .args(["-eo", "pid=,args="])
            .output()
            .await
    }
    .map_err(|e| DiscoveryError::ProcessProbe(e.to_string()))?;

    if !output.status.success() {
        return Err(DiscoveryError::ProcessProbe(format!(
            "exit status {}",
            output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn discovery_for(data_dirs: Vec<PathBuf>, listing: &str) -> Discovery {
        let paths = DiscoveryPaths {
            install_paths: vec![PathBuf::from("/nonexistent/smaart9")],
            primary_data_path: data_dirs[0].clone(),
            data_dirs,
        };
        Discovery::new(paths, ProcessListing::Fixed(listing.to_string()))
    }

    #[test]
    fn test_measurement_file_filter() {
        assert!(is_measurement_file("room.csv"));
        assert!(is_measurement_file("ROOM.TXT"));
        assert!(is_measurement_file("a.measurement"));
        assert!(is_measurement_file("MySmaartExport"));
        assert!(!is_measurement_file("notes.pdf"));
        assert!(!is_measurement_file("csv"));
    }

    #[test]
    fn test_parse_ps_listing() {
        let listing = "  1 /sbin/init\n 4242 /Applications/Smaart Suite.app/Contents/MacOS/Smaart Suite\n 4243 smaart-helper\n";
        let info = parse_process_listing(listing).unwrap();
        assert_eq!(info.pid, Some(4242));
        assert_eq!(info.variant, ProductVariant::SmaartSuite);
        assert_eq!(info.count, 2);
    }

    #[test]
    fn test_parse_tasklist_listing() {
        let listing = "\"explorer.exe\",\"100\",\"Console\",\"1\",\"10 K\"\r\n\"Smaart v9.exe\",\"2048\",\"Console\",\"1\",\"200 K\"\r\n";
        let info = parse_process_listing(listing).unwrap();
        assert_eq!(info.pid, Some(2048));
        assert_eq!(info.command, "Smaart v9.exe");
        assert_eq!(info.variant, ProductVariant::SmaartV9);
    }

    #[test]
    fn test_parse_listing_without_match() {
        assert!(parse_process_listing(" 1 /sbin/init\n 2 bash\n").is_none());
        assert!(parse_process_listing("").is_none());
    }

    #[tokio::test]
    async fn test_installation_falls_back_to_process() {
        let dir = TempDir::new().unwrap();
        let discovery = discovery_for(vec![dir.path().to_path_buf()], " 77 smaart9\n");
        match discovery.detect_installation().await {
            Some(InstallationInfo::RunningProcess { process }) => assert_eq!(process.pid, Some(77)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_installation_prefers_install_path() {
        let dir = TempDir::new().unwrap();
        let exe = dir.path().join("Smaart v9.exe");
        std::fs::write(&exe, b"").unwrap();
        let mut discovery = discovery_for(vec![dir.path().to_path_buf()], " 77 smaart9\n");
        discovery.paths.install_paths.push(exe.clone());

        assert_eq!(
            discovery.detect_installation().await,
            Some(InstallationInfo::InstallPath {
                path: exe,
                variant: ProductVariant::SmaartV9
            })
        );
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let dir = TempDir::new().unwrap();
        let discovery = discovery_for(vec![dir.path().to_path_buf()], "");
        assert!(discovery.detect_installation().await.is_none());
    }

    #[tokio::test]
    async fn test_first_directory_with_matches_wins() {
        let missing = PathBuf::from("/nonexistent/sab-data");
        let empty = TempDir::new().unwrap();
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(empty.path().join("readme.pdf"), b"x").unwrap();
        std::fs::write(first.path().join("b.csv"), b"x").unwrap();
        std::fs::write(first.path().join("a.txt"), b"x").unwrap();
        std::fs::write(second.path().join("c.csv"), b"x").unwrap();

        let discovery = discovery_for(
            vec![
                missing,
                empty.path().to_path_buf(),
                first.path().to_path_buf(),
                second.path().to_path_buf(),
            ],
            "",
        );
        let scan = discovery.list_measurement_files().await;

        let names: Vec<&str> = scan.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.csv"]);
        assert_eq!(scan.directory.as_deref(), Some(first.path()));
        assert!(scan.errors.is_empty());
        assert_eq!(scan.files[1].format, FileFormat::Csv);
        assert_eq!(scan.files[1].extension, "csv");
    }

    #[tokio::test]
    async fn test_no_files_anywhere() {
        let dir = TempDir::new().unwrap();
        let discovery = discovery_for(vec![dir.path().to_path_buf()], "");
        let scan = discovery.list_measurement_files().await;
        assert!(scan.files.is_empty());
        assert!(scan.directory.is_none());
    }

    #[test]
    fn test_data_dir_override() {
        let paths = DiscoveryPaths::for_current_platform().with_data_dir(PathBuf::from("/data"));
        assert_eq!(paths.data_dirs, vec![PathBuf::from("/data")]);
        assert_eq!(paths.primary_data_path, PathBuf::from("/data"));
        assert!(!paths.install_paths.is_empty());
    }
}
