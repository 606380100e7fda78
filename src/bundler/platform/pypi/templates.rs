//! Wheel templates.

/// Package `__init__.py`. `run` is the console script target: it marks the
/// bundled binary executable and replaces the interpreter with it (spawns
/// and forwards the exit code on Windows).
pub const INIT_PY: &str = r#"from pathlib import Path
import os
import sys
import subprocess

def get_path() -> Path:
    parent = Path(__file__).parent
    return (parent / "bin" / "{{bin_name}}").resolve()

def run() -> None:
    path = get_path()
    path.chmod(0o774)
    if sys.platform == "win32":
        sys.exit(subprocess.run([path, *sys.argv[1:]]).returncode)
    else:
        os.execv(path, [str(path), *sys.argv[1:]])
"#;

pub const WHEEL: &str = "Wheel-Version: 1.0
Generator: {{generator}}
Root-Is-Purelib: false
Tag: {{tag}}";
