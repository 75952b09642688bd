/// convertコマンドのテスト
///
/// フラグメントディレクトリからSQLとJSONを生成し、ファイルに書き込むまでの
/// 一連の処理と、失敗時に部分的な出力を残さないことを確認します。

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[cfg(test)]
mod convert_command_tests {
    use super::*;
    use dmdgen::adapters::output_writer::OutputWriter;
    use dmdgen::cli::commands::convert::{ConvertCommand, ConvertCommandHandler};
    use dmdgen::core::config::RunConfig;
    use dmdgen::core::error::{ConvertError, ConvertResult};
    use dmdgen::services::model_serializer::ModelSerializer;
    use std::cell::RefCell;

    const TYPES: &str = r#"
<TypesLookup>
  <Platform name="Oracle Database 21c">
    <Type logical="integer" native="NUMBER"/>
    <Type logical="varchar" native="VARCHAR2({length})"/>
  </Platform>
</TypesLookup>"#;

    /// 書き込み内容を記録するテスト用ライター
    #[derive(Default)]
    struct RecordingWriter {
        writes: RefCell<Vec<(PathBuf, String)>>,
        fail_on: Option<&'static str>,
    }

    impl OutputWriter for RecordingWriter {
        fn write(&self, target: &Path, contents: &str) -> ConvertResult<()> {
            if let Some(suffix) = self.fail_on {
                if target.to_string_lossy().ends_with(suffix) {
                    return Err(ConvertError::WriteFailure {
                        path: target.to_path_buf(),
                        cause: "disk full".to_string(),
                    });
                }
            }
            self.writes
                .borrow_mut()
                .push((target.to_path_buf(), contents.to_string()));
            Ok(())
        }
    }

    /// テスト用のプロジェクト（design/ と types.xml）を作成
    fn setup_project() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let design = temp_dir.path().join("design");
        fs::create_dir_all(design.join("tables")).unwrap();

        fs::write(
            design.join("tables/a.xml"),
            r#"<Table id="T_1" name="A">
  <Column id="C_1" name="id" type="integer" position="1" nullable="false"/>
  <Column id="C_2" name="name" type="varchar" length="50" position="2"/>
  <PrimaryKey><ColumnRef ref="C_1"/></PrimaryKey>
</Table>"#,
        )
        .unwrap();
        fs::write(
            design.join("tables/b.xml"),
            r#"<Table id="T_2" name="B">
  <Column id="C_3" name="id" type="integer" position="1" nullable="false"/>
  <Column id="C_4" name="a_id" type="integer" position="2"/>
  <PrimaryKey><ColumnRef ref="C_3"/></PrimaryKey>
</Table>"#,
        )
        .unwrap();
        fs::write(
            design.join("relationships.xml"),
            r#"<Relationship id="R_1" parent="T_1" child="T_2">
  <ColumnPair child="C_4" parent="C_1"/>
</Relationship>"#,
        )
        .unwrap();
        fs::write(temp_dir.path().join("types.xml"), TYPES).unwrap();

        temp_dir
    }

    fn config_for(project: &TempDir) -> RunConfig {
        let root = project.path();
        RunConfig {
            types: Some(root.join("types.xml")),
            sql_output: Some(root.join("out/schema.sql")),
            json_output: Some(root.join("out/schema.json")),
            ..RunConfig::new(root.join("design"))
        }
    }

    /// SQLとJSONをファイルに書き込む
    #[test]
    fn test_convert_writes_sql_and_json() {
        let project = setup_project();
        let config = config_for(&project);
        let handler = ConvertCommandHandler::new();

        let summary = handler.execute(&ConvertCommand { config }).unwrap();

        let sql = fs::read_to_string(project.path().join("out/schema.sql")).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE A (id NUMBER NOT NULL, name VARCHAR2(50), PRIMARY KEY (id));\n\
             CREATE TABLE B (id NUMBER NOT NULL, a_id NUMBER, PRIMARY KEY (id));\n\
             ALTER TABLE B ADD FOREIGN KEY (a_id) REFERENCES A (id);\n"
        );

        let json = fs::read_to_string(project.path().join("out/schema.json")).unwrap();
        let model = ModelSerializer::new().deserialize_from_str(&json).unwrap();
        assert_eq!(model.table_count(), 2);
        assert_eq!(model.relationship_count(), 1);

        assert!(summary.contains("Fragments: 3"));
        assert!(summary.contains("Tables: 2"));
        assert!(summary.contains("Statements: 3"));
    }

    /// 型ルックアップ文書がなければJSONのみ生成する
    #[test]
    fn test_convert_json_only_without_types() {
        let project = setup_project();
        let config = RunConfig {
            json_output: Some(project.path().join("model.json")),
            ..RunConfig::new(project.path().join("design"))
        };
        let writer = RecordingWriter::default();

        ConvertCommandHandler::new()
            .execute_with_writer(&ConvertCommand { config }, &writer)
            .unwrap();

        let writes = writer.writes.borrow();
        assert_eq!(writes.len(), 1);
        assert!(writes[0].0.ends_with("model.json"));
    }

    /// SQL出力先があっても型ルックアップ文書がなければSQLを省略しJSONは書き込む
    #[test]
    fn test_sql_output_without_types_still_writes_json() {
        let project = setup_project();
        let config = RunConfig {
            types: None,
            ..config_for(&project)
        };
        assert!(config.validate().is_ok());
        let writer = RecordingWriter::default();

        let summary = ConvertCommandHandler::new()
            .execute_with_writer(&ConvertCommand { config }, &writer)
            .unwrap();

        let writes = writer.writes.borrow();
        assert_eq!(writes.len(), 1);
        assert!(writes[0].0.ends_with("out/schema.json"));
        assert!(summary.contains("SQL skipped (no types file)"));
        assert!(!summary.contains("Statements:"));
    }

    /// 未知のプラットフォームではSQLは出力されないがJSONは出力される
    #[test]
    fn test_sql_failure_does_not_stop_json() {
        let project = setup_project();
        let config = RunConfig {
            platform: "DB2".to_string(),
            ..config_for(&project)
        };
        let writer = RecordingWriter::default();

        let error = ConvertCommandHandler::new()
            .execute_with_writer(&ConvertCommand { config }, &writer)
            .unwrap_err();

        assert!(format!("{:#}", error).contains("Unknown platform 'DB2'"));
        let writes = writer.writes.borrow();
        assert_eq!(writes.len(), 1);
        assert!(writes[0].0.ends_with("schema.json"));
    }

    /// 両方の出力が失敗した場合はすべての失敗を報告する
    #[test]
    fn test_all_failures_are_reported() {
        let project = setup_project();
        let config = RunConfig {
            platform: "DB2".to_string(),
            ..config_for(&project)
        };
        let writer = RecordingWriter {
            fail_on: Some("schema.json"),
            ..RecordingWriter::default()
        };

        let error = ConvertCommandHandler::new()
            .execute_with_writer(&ConvertCommand { config }, &writer)
            .unwrap_err();

        let message = format!("{:#}", error);
        assert!(message.starts_with("2 outputs failed"));
        assert!(message.contains("DB2"));
        assert!(message.contains("disk full"));
        assert!(writer.writes.borrow().is_empty());
    }

    /// 参照解決に失敗した場合は何も書き込まない
    #[test]
    fn test_dangling_reference_writes_nothing() {
        let project = setup_project();
        fs::write(
            project.path().join("design/broken.xml"),
            r#"<Column id="C_9" table="T_999" name="orphan" type="integer"/>"#,
        )
        .unwrap();
        let writer = RecordingWriter::default();

        let error = ConvertCommandHandler::new()
            .execute_with_writer(
                &ConvertCommand {
                    config: config_for(&project),
                },
                &writer,
            )
            .unwrap_err();

        assert!(format!("{:#}", error).contains("T_999"));
        assert!(writer.writes.borrow().is_empty());
        assert!(!project.path().join("out").exists());
    }

    /// モデルのルートが存在しない場合
    #[test]
    fn test_missing_model_root() {
        let project = TempDir::new().unwrap();
        let config = RunConfig {
            json_output: Some(project.path().join("model.json")),
            ..RunConfig::new(project.path().join("missing"))
        };

        let error = ConvertCommandHandler::new()
            .execute(&ConvertCommand { config })
            .unwrap_err();

        assert!(format!("{:#}", error).contains("Path not found"));
    }
}
