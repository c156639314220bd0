//! Built-in catalog of `act` command-line options

use super::CustomOption;

struct OptionDef {
    name: &'static str,
    group: &'static str,
    description: &'static str,
    default: Option<&'static str>,
    editable: bool,
    boolean: bool,
}

const fn switch(name: &'static str, group: &'static str, description: &'static str) -> OptionDef {
    OptionDef {
        name,
        group,
        description,
        default: None,
        editable: false,
        boolean: false,
    }
}

const fn value(
    name: &'static str,
    group: &'static str,
    description: &'static str,
    default: Option<&'static str>,
) -> OptionDef {
    OptionDef {
        name,
        group,
        description,
        default,
        editable: true,
        boolean: false,
    }
}

const fn toggle(
    name: &'static str,
    group: &'static str,
    description: &'static str,
    default: &'static str,
) -> OptionDef {
    OptionDef {
        name,
        group,
        description,
        default: Some(default),
        editable: true,
        boolean: true,
    }
}

const CATALOG: &[OptionDef] = &[
    value(
        "--action-cache-path",
        "actions",
        "Defines the path where the actions get cached and host workspaces created.",
        None,
    ),
    switch(
        "--action-offline-mode",
        "actions",
        "If action contents exists, it will not be fetched and pulled again.",
    ),
    switch(
        "--use-new-action-cache",
        "actions",
        "Enable using the new Action Cache for storing Actions locally.",
    ),
    value(
        "--local-repository",
        "actions",
        "Replaces the specified repository and ref with a local folder (e.g. https://github.com/test/test@v0=/home/act/test).",
        None,
    ),
    switch(
        "--no-recurse",
        "actions",
        "Disable running workflows from subdirectories of the path given with --workflows.",
    ),
    value(
        "--artifact-server-path",
        "artifacts",
        "Defines the path where the artifact server stores uploads and retrieves downloads from.",
        None,
    ),
    value(
        "--artifact-server-port",
        "artifacts",
        "Defines the port where the artifact server listens.",
        Some("34567"),
    ),
    value(
        "--cache-server-path",
        "artifacts",
        "Defines the path where the cache server stores caches.",
        None,
    ),
    switch(
        "--no-cache-server",
        "artifacts",
        "Disable the cache server.",
    ),
    switch(
        "--bind",
        "container",
        "Bind working directory to container, rather than copy.",
    ),
    value(
        "--container-architecture",
        "container",
        "Architecture which should be used to run containers, e.g. linux/amd64.",
        None,
    ),
    value(
        "--container-cap-add",
        "container",
        "Kernel capabilities to add to the workflow containers (e.g. SYS_PTRACE).",
        None,
    ),
    value(
        "--container-cap-drop",
        "container",
        "Kernel capabilities to remove from the workflow containers (e.g. SYS_PTRACE).",
        None,
    ),
    value(
        "--container-daemon-socket",
        "container",
        "URI to Docker Engine socket (e.g. unix://~/.docker/run/docker.sock).",
        None,
    ),
    value(
        "--container-options",
        "container",
        "Custom docker container options for the job container without an options property in the job definition.",
        None,
    ),
    value(
        "--network",
        "container",
        "Sets a docker network name.",
        Some("host"),
    ),
    toggle(
        "--pull",
        "container",
        "Pull docker image(s) even if already present.",
        "true",
    ),
    toggle(
        "--rebuild",
        "container",
        "Rebuild local action docker image(s) even if already present.",
        "true",
    ),
    switch(
        "--reuse",
        "container",
        "Don't remove container(s) on successfully completed workflow(s) to maintain state between runs.",
    ),
    switch(
        "--rm",
        "container",
        "Automatically remove container(s)/volume(s) after a workflow(s) failure.",
    ),
    value(
        "--userns",
        "container",
        "User namespace to use.",
        None,
    ),
    value(
        "--defaultbranch",
        "repository",
        "The name of the main branch.",
        None,
    ),
    value(
        "--remote-name",
        "repository",
        "Git remote name that will be used to retrieve the url of the git repo.",
        Some("origin"),
    ),
    toggle(
        "--use-gitignore",
        "repository",
        "Controls whether paths specified in .gitignore should be copied into the container.",
        "true",
    ),
    switch(
        "--no-skip-checkout",
        "repository",
        "Use actions/checkout instead of copying local files into the container.",
    ),
    value(
        "--matrix",
        "execution",
        "Specify which matrix configuration to include (e.g. os:ubuntu-latest).",
        None,
    ),
    switch(
        "--detect-event",
        "execution",
        "Use the first event type from the workflow as the event that triggered it.",
    ),
    switch(
        "--verbose",
        "output",
        "Verbose output.",
    ),
    switch(
        "--json",
        "output",
        "Output logs in json format.",
    ),
    switch(
        "--log-prefix-job-id",
        "output",
        "Output the job id within non-json logs instead of the entire name.",
    ),
    switch(
        "--insecure-secrets",
        "output",
        "Does not hide secrets while printing logs. Not recommended.",
    ),
];

/// The option catalog in declaration order, nothing selected
pub fn default_options() -> Vec<CustomOption> {
    CATALOG
        .iter()
        .map(|def| CustomOption {
            name: def.name.to_string(),
            value: String::new(),
            default: def.default.map(str::to_string),
            description: def.description.to_string(),
            selected: false,
            editable: def.editable,
            boolean: def.boolean,
            group: def.group.to_string(),
        })
        .collect()
}
