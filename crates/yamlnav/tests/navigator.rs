use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre;
use indoc::indoc;
use test_util::prelude::*;
use vfs::VfsPath;
use yamlnav::{
    Config, HistoryKind, ManualClock, NavError, Navigator, PickAction, Picker, PickerEntry,
    Selection, SourceId, VfsHost,
};
use yamlnav_project::ProjectScanner;

/// Picks the first entry whose ordinal contains `query`.
#[derive(Debug, Default)]
struct ScriptedPicker {
    query: Option<String>,
    action: Option<PickAction>,
    prompts: Vec<(String, Vec<PickAction>)>,
}

impl ScriptedPicker {
    fn choosing(query: &str) -> Self {
        Self {
            query: Some(query.to_string()),
            ..Self::default()
        }
    }

    fn with_action(mut self, action: PickAction) -> Self {
        self.action = Some(action);
        self
    }
}

impl Picker for ScriptedPicker {
    fn pick(
        &mut self,
        prompt: &str,
        entries: Vec<PickerEntry>,
        actions: &[PickAction],
    ) -> Option<Selection> {
        self.prompts.push((prompt.to_string(), actions.to_vec()));
        let query = self.query.as_deref()?;
        let entry = entries.into_iter().find(|e| e.ordinal.contains(query))?;
        let action = self.action.unwrap_or(actions[0]);
        Some(Selection { entry, action })
    }
}

struct Session {
    root: VfsPath,
    clock: ManualClock,
    nav: Navigator<VfsHost>,
}

fn session(config: Config) -> eyre::Result<Session> {
    let root = VfsPath::new(vfs::MemoryFS::new());
    write(
        &root.join("deployment.yaml")?,
        test_util::read_testdata("manifests/deployment.yaml"),
    )?;
    let clock = ManualClock::new();
    let host = VfsHost::new(root.clone()).with_current("/deployment.yaml");
    let nav = Navigator::with_clock(host, config, Arc::new(clock.clone()));
    Ok(Session { root, clock, nav })
}

fn structured() -> Config {
    Config {
        structured_parser: true,
        ..Config::default()
    }
}

#[test]
fn results_are_cached_until_saved_or_expired() -> eyre::Result<()> {
    Builder::default().build();
    let Session {
        root,
        clock,
        mut nav,
    } = session(Config::default())?;
    let current = SourceId::CurrentBuffer;
    assert_that!(nav.paths(&current)?, contains_path("spec.replicas"));

    write(&root.join("deployment.yaml")?, "replicas: 1\n")?;
    assert_that!(nav.paths(&current)?, contains_path("spec.replicas"));

    nav.on_file_saved(Utf8Path::new("/deployment.yaml"));
    let fresh = nav.paths(&current)?;
    assert_that!(fresh, not(contains_path("spec.replicas")));
    assert_that!(fresh, contains_path("replicas"));

    write(&root.join("deployment.yaml")?, "kind: Service\n")?;
    clock.advance(Duration::from_secs(299));
    assert_that!(nav.paths(&current)?, contains_path("replicas"));
    clock.advance(Duration::from_secs(1));
    assert_that!(nav.paths(&current)?, contains_path("kind"));
    Ok(())
}

#[test]
fn disabled_cache_always_reads_the_host() -> eyre::Result<()> {
    Builder::default().build();
    let mut config = Config::default();
    config.cache.enabled = false;
    let Session { root, mut nav, .. } = session(config)?;

    assert_eq!(nav.values(&SourceId::CurrentBuffer)?.len(), 8);
    write(&root.join("deployment.yaml")?, "a: 1\n")?;
    assert_that!(
        nav.values(&SourceId::CurrentBuffer)?,
        elements_are![has_value("a", "1")]
    );
    assert!(nav.cache().is_empty());
    Ok(())
}

#[test]
fn jump_to_path_moves_cursor_and_records_history() -> eyre::Result<()> {
    Builder::default().build();
    let Session { mut nav, .. } = session(Config::default())?;
    let mut picker = ScriptedPicker::choosing("containers.2.image");

    let jump = nav
        .jump_to_path(&SourceId::CurrentBuffer, &mut picker)?
        .ok_or_else(|| eyre::eyre!("nothing picked"))?;
    assert_eq!(jump.line, 24);
    assert_eq!(jump.action, PickAction::Jump);
    assert_eq!(
        nav.host().cursor(),
        Some((Utf8Path::new("/deployment.yaml"), 24))
    );
    assert_eq!(
        picker.prompts,
        vec![("YAML paths".to_string(), vec![PickAction::Jump])]
    );

    let last = nav
        .history()
        .last()
        .ok_or_else(|| eyre::eyre!("empty history"))?;
    assert_eq!(last.kind, HistoryKind::Path);
    assert_eq!(last.value, "spec.template.spec.containers.2.image");
    Ok(())
}

#[test]
fn cancelled_pick_changes_nothing() -> eyre::Result<()> {
    Builder::default().build();
    let Session { mut nav, .. } = session(Config::default())?;
    let mut picker = ScriptedPicker::default();
    assert_eq!(nav.jump_to_value(&SourceId::CurrentBuffer, &mut picker)?, None);
    assert!(nav.history().is_empty());
    assert_eq!(nav.host().cursor(), None);
    Ok(())
}

#[test]
fn edit_picked_value_then_jump_from_history() -> eyre::Result<()> {
    Builder::default().build();
    let Session { mut nav, .. } = session(structured())?;
    let current = SourceId::CurrentBuffer;

    nav.jump_to_path(&current, &mut ScriptedPicker::choosing("containers.2.image"))?;
    let mut picker = ScriptedPicker::choosing("busybox").with_action(PickAction::Edit);
    let jump = nav
        .jump_to_value(&current, &mut picker)?
        .ok_or_else(|| eyre::eyre!("nothing picked"))?;
    assert_eq!(
        picker.prompts[0].1,
        vec![PickAction::Jump, PickAction::Edit]
    );
    assert_eq!(jump.action, PickAction::Edit);
    assert_eq!(jump.line, 24);

    let changed = nav.edit_value(&jump.source, jump.line, |current| {
        assert_eq!(current, "busybox:1.36");
        Some("busybox:1.37".to_string())
    })?;
    assert!(changed);
    assert_that!(
        nav.values(&current)?,
        contains(has_value("spec.template.spec.containers.2.image", "busybox:1.37"))
    );

    let kinds: Vec<(HistoryKind, &str)> = nav
        .history()
        .entries()
        .map(|e| (e.kind, e.value.as_str()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (HistoryKind::Path, "spec.template.spec.containers.2.image"),
            (HistoryKind::Value, "busybox:1.36"),
        ]
    );

    let err = nav
        .jump_from_history(&current, &mut ScriptedPicker::choosing("busybox"))
        .unwrap_err();
    assert!(matches!(err, NavError::NotFound { kind: HistoryKind::Value, .. }));

    let jump = nav
        .jump_from_history(&current, &mut ScriptedPicker::choosing("containers.2"))?
        .ok_or_else(|| eyre::eyre!("nothing picked"))?;
    assert_eq!(jump.line, 24);
    assert_eq!(nav.history().len(), 3);
    Ok(())
}

#[test]
fn editing_a_deployment_name() -> eyre::Result<()> {
    Builder::default().build();
    let Session { root, mut nav, .. } = session(Config::default())?;
    let current = SourceId::CurrentBuffer;
    assert_that!(
        nav.values(&current)?,
        contains(has_value("metadata.name", "nginx-deployment"))
    );

    assert!(nav.edit_value(&current, 5, |_| Some("web".to_string()))?);
    let lines = root.join("deployment.yaml")?.read_to_string()?;
    assert_eq!(lines.lines().nth(4), Some("  name: web"));
    assert_that!(nav.values(&current)?, contains(has_value("metadata.name", "web")));
    Ok(())
}

#[test]
fn editing_the_current_buffer_refreshes_file_results() -> eyre::Result<()> {
    Builder::default().build();
    let Session { mut nav, .. } = session(Config::default())?;
    let file = SourceId::File(Utf8PathBuf::from("/deployment.yaml"));
    assert_that!(
        nav.values(&file)?,
        contains(has_value("metadata.name", "nginx-deployment"))
    );

    assert!(nav.edit_value(&SourceId::CurrentBuffer, 5, |_| Some("web".to_string()))?);
    let values = nav.values(&file)?;
    assert_that!(values, contains(has_value("metadata.name", "web")));
    assert_that!(
        values,
        not(contains(has_value("metadata.name", "nginx-deployment")))
    );
    Ok(())
}

#[test]
fn keys_and_queries() -> eyre::Result<()> {
    Builder::default().build();
    let Session { mut nav, .. } = session(Config::default())?;
    let current = SourceId::CurrentBuffer;

    let keys: Vec<usize> = nav
        .keys(&current, "ima", None)?
        .iter()
        .map(|e| e.line)
        .collect();
    assert_eq!(keys, vec![20, 24]);

    let found = nav.find_path(&current, "spec.replicas", None)?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].line, 9);
    assert!(nav.find_path(&current, "spec.missing", None)?.is_empty());
    Ok(())
}

#[test]
fn project_wide_jump_opens_the_file() -> eyre::Result<()> {
    Builder::default().build();
    let root = VfsPath::new(vfs::MemoryFS::new());
    write(
        &root.join("deploy/app.yaml")?,
        indoc! {"
            metadata:
              name: web
            spec:
              replicas: 2
        "},
    )?;
    write(&root.join("values.yaml")?, "replicaCount: 1\n")?;
    write(&root.join("notes.md")?, "replicas: no\n")?;

    let host = VfsHost::new(root.clone()).with_current("/values.yaml");
    let mut nav = Navigator::with_clock(host, Config::default(), Arc::new(ManualClock::new()));
    let scanner = ProjectScanner::new(root.clone(), "/");

    let values = nav.project_values(&scanner)?;
    assert_eq!(values.len(), 3);
    let files: Vec<Option<Utf8PathBuf>> = values
        .iter()
        .map(|v| v.file.as_ref().map(|f| f.relative_path.clone()))
        .collect();
    assert_eq!(
        files,
        vec![
            Some(Utf8PathBuf::from("deploy/app.yaml")),
            Some(Utf8PathBuf::from("deploy/app.yaml")),
            Some(Utf8PathBuf::from("values.yaml")),
        ]
    );

    let paths = nav.project_paths(&scanner)?;
    let jump = nav
        .pick_path(
            &SourceId::CurrentBuffer,
            &paths,
            &mut ScriptedPicker::choosing("spec.replicas"),
        )?
        .ok_or_else(|| eyre::eyre!("nothing picked"))?;
    assert_eq!(jump.source, SourceId::File(Utf8PathBuf::from("/deploy/app.yaml")));
    assert_eq!(jump.line, 4);
    assert_eq!(
        nav.host().cursor(),
        Some((Utf8Path::new("/deploy/app.yaml"), 4))
    );

    // per-file results are cached by absolute path
    write(&root.join("deploy/app.yaml")?, "other: 1\n")?;
    assert_that!(nav.project_paths(&scanner)?, contains_path("spec.replicas"));
    nav.on_file_saved(Utf8Path::new("/deploy/app.yaml"));
    let paths = nav.project_paths(&scanner)?;
    assert_that!(paths, not(contains_path("spec.replicas")));
    assert_that!(paths, contains_path("other"));
    Ok(())
}

#[test]
fn clear_cache_for_one_source_or_all() -> eyre::Result<()> {
    Builder::default().build();
    let Session { mut nav, .. } = session(Config::default())?;
    nav.paths(&SourceId::CurrentBuffer)?;
    nav.paths(&SourceId::File(Utf8PathBuf::from("/deployment.yaml")))?;
    assert!(!nav.cache().is_empty());

    nav.clear_cache(Some(&SourceId::CurrentBuffer));
    let before = nav.cache().len();
    nav.clear_cache(None);
    assert!(before > 0);
    assert!(nav.cache().is_empty());
    Ok(())
}
