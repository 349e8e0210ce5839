use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config;

pub const DEFAULT_CONFIG: &str = r#"# umlgen configuration

[generator]
# Path to the UML generator jar (or any executable taking -i/-o)
# tool_path = "/opt/uml-generator/uml-generator.jar"

# Java launcher used for .jar tools
java_path = "java"

# Extensions stripped from file names when naming the diagram
source_extensions = ["java"]

# Kill the generator after this many seconds
# timeout_secs = 300

# Pass -v to the generator and echo its output
verbose = false

[diagram]
# Emit relationship arrows between classes
include_relationships = true

[output]
# Output directory, relative to the workspace root (or the input when none is set)
# directory = "build/uml"

# Open the generated diagram when done
auto_open_file = true

# Anchor for relative output directories
# workspace_root = "/path/to/project"

# Result format: text, json
format = "text"
"#;

pub fn run(init: bool, explicit: Option<&Path>) -> Result<()> {
    let config_path = config::user_config_path()?;

    if init {
        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at {}",
                config_path.display()
            );
        }
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&config_path, DEFAULT_CONFIG)?;
        info!("Created config file at: {}", config_path.display());
    } else if let Some(active) = config::find(explicit)? {
        let content = fs::read_to_string(&active)?;
        println!("Config file: {}\n", active.display());
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run `umlgen config --init` to create one at:");
        println!("  {}", config_path.display());
        println!("\nOr put a {} in the current directory.", config::LOCAL_CONFIG);
        println!("\nEnvironment variables:");
        println!("  UMLGEN_TOOL_PATH=/path/to/uml-generator.jar");
        println!("  UMLGEN_OUTPUT_DIR=build/uml");
        println!("  UMLGEN_JAVA=/usr/bin/java");
    }

    Ok(())
}
