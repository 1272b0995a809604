use std::env;
use std::path::PathBuf;

use crate::types::Charset;

pub(crate) fn default_library_candidates() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["scws.dll", "libscws.dll"]
    }
    #[cfg(target_os = "macos")]
    {
        &[
            "libscws.dylib",
            "scws.dylib",
            "/usr/local/scws/lib/libscws.dylib",
            "/usr/local/lib/libscws.dylib",
            "/opt/homebrew/lib/libscws.dylib",
        ]
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        &[
            "libscws.so",
            "scws.so",
            "./libscws.so",
            "/usr/local/scws/lib/libscws.so",
            "/usr/local/lib/libscws.so",
            "/usr/lib/libscws.so",
        ]
    }
}

pub(crate) fn discover_default_library_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        if let Some(local_app_data) = env::var_os("LOCALAPPDATA") {
            let path = PathBuf::from(local_app_data)
                .join("scws")
                .join("lib")
                .join("scws.dll");
            if path.exists() {
                return Some(path);
            }
        }
        let well_known = [
            PathBuf::from("C:\\scws\\lib\\scws.dll"),
            PathBuf::from("C:\\Program Files\\scws\\lib\\scws.dll"),
        ];
        for path in well_known {
            if path.exists() {
                return Some(path);
            }
        }
    }

    #[cfg(unix)]
    {
        #[cfg(target_os = "macos")]
        let file_name = "libscws.dylib";
        #[cfg(not(target_os = "macos"))]
        let file_name = "libscws.so";

        if let Some(home) = env::var_os("HOME") {
            let path = PathBuf::from(home)
                .join(".local")
                .join("scws")
                .join("lib")
                .join(file_name);
            if path.exists() {
                return Some(path);
            }
        }

        // /usr/local/scws is the library's default install prefix.
        let well_known = [
            PathBuf::from("/usr/local/scws/lib").join(file_name),
            PathBuf::from("/usr/local/lib").join(file_name),
            PathBuf::from("/usr/lib").join(file_name),
        ];
        for path in well_known {
            if path.exists() {
                return Some(path);
            }
        }
    }

    None
}

fn dictionary_file_names(charset: Charset) -> &'static [&'static str] {
    match charset {
        Charset::Utf8 => &["dict.utf8.xdb"],
        Charset::Gbk => &["dict.gbk.xdb", "dict.xdb"],
    }
}

fn rule_file_names(charset: Charset) -> &'static [&'static str] {
    match charset {
        Charset::Utf8 => &["rules.utf8.ini"],
        Charset::Gbk => &["rules.ini"],
    }
}

fn data_search_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Some(home) = env::var_os("HOME") {
        roots.push(PathBuf::from(home).join(".local").join("scws").join("etc"));
    }

    #[cfg(target_os = "windows")]
    {
        roots.push(PathBuf::from("C:\\scws\\etc"));
        roots.push(PathBuf::from("C:\\Program Files\\scws\\etc"));
    }

    #[cfg(unix)]
    {
        roots.push(PathBuf::from("/usr/local/scws/etc"));
        roots.push(PathBuf::from("/usr/local/share/scws"));
        roots.push(PathBuf::from("/usr/share/scws"));
    }

    roots
}

pub(crate) fn discover_default_dict_path(charset: Charset) -> Option<PathBuf> {
    if let Some(path) = env::var_os("SCWS_DICT_PATH") {
        return Some(PathBuf::from(path));
    }

    for root in data_search_roots() {
        for file_name in dictionary_file_names(charset) {
            let path = root.join(file_name);
            if path.exists() {
                return Some(path);
            }
        }
    }

    None
}

pub(crate) fn discover_default_rule_path(charset: Charset) -> Option<PathBuf> {
    if let Some(path) = env::var_os("SCWS_RULE_PATH") {
        return Some(PathBuf::from(path));
    }

    for root in data_search_roots() {
        for file_name in rule_file_names(charset) {
            let path = root.join(file_name);
            if path.exists() {
                return Some(path);
            }
        }
    }

    None
}
