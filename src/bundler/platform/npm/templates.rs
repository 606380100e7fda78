//! `index.js` templates.

/// Per-platform package entry point. Exposes the bundled binary path.
pub const BIN_INDEX_JS: &str = r#"import { join } from "node:path";
import { existsSync } from "node:fs";

export function getBinPath() {
  const binPath = join(import.meta.dirname, "bin", "{{bin_filename}}");
  if (!existsSync(binPath)) {
    throw new Error(`Binary not found at expected path: ${binPath}`);
  }
  return binPath;
}
"#;

/// Main package launcher. Picks the platform package for
/// `${process.platform}-${process.arch}`, runs its binary with the trailing
/// arguments and exits with the child's code.
pub const MAIN_INDEX_JS: &str = r#"#!/usr/bin/env node

import { spawn } from "node:child_process";
import { chmod } from "node:fs/promises";

const supported_platforms = new Map([
{{#each packages}}
  ["{{this.key}}", "{{this.name}}"],
{{/each}}
]);

async function run() {
  const key = `${process.platform}-${process.arch}`;
  if (!supported_platforms.has(key)) {
    throw new Error(`Platform ${key} is not supported`);
  }

  const pkg = supported_platforms.get(key);
  let getBinPath;
  try {
    ({ getBinPath } = await import(pkg));
  } catch (err) {
    console.error(`Failed to import ${pkg}.`);
    console.error(`Please make sure to install the package ${pkg} as a dependency.`);
    throw err;
  }

  const binPath = getBinPath();
  await chmod(binPath, 0o774);
  return new Promise((resolve) => {
    const child = spawn(binPath, process.argv.slice(2), { stdio: "inherit" });
    child.on("close", (code) => resolve(code ?? 1));
  });
}

process.exit(await run());
"#;
