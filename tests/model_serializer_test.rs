/// ModelSerializerのテスト
///
/// フラグメントから読み込んだモデルのJSON往復変換と、
/// JSON構造の主要なフィールドを確認します。

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[cfg(test)]
mod model_serializer_tests {
    use super::*;
    use dmdgen::services::model_loader::ModelLoader;
    use dmdgen::services::model_serializer::ModelSerializer;

    const DESIGN: &str = r#"
<Design>
  <Domain id="D_1" name="Code" type="varchar" length="8"/>
  <Table id="T_1" name="country" schema="geo" comment="ISO countries">
    <Column id="C_1" name="code" domain="D_1" position="1" nullable="false"/>
    <Column id="C_2" name="name" type="varchar" length="80" position="2">
      <Comment>English short name</Comment>
    </Column>
    <PrimaryKey><ColumnRef ref="C_1"/></PrimaryKey>
  </Table>
  <Table id="T_2" name="city" schema="geo">
    <Column id="C_3" name="id" type="integer" position="1" nullable="false"/>
    <Column id="C_4" name="country_code" domain="D_1" position="2" default="'XX'"/>
    <Column id="C_5" name="capital_of" domain="D_1" position="3"/>
    <PrimaryKey><ColumnRef ref="C_3"/></PrimaryKey>
  </Table>
  <ForeignKey id="R_1" name="fk_city_country" parent="T_1" child="T_2" cardinality="1:N">
    <ColumnPair child="C_4" parent="C_1"/>
  </ForeignKey>
  <Relationship id="R_2" parent="T_1" child="T_2" cardinality="1:1">
    <ColumnPair child="C_5" parent="C_1"/>
  </Relationship>
</Design>"#;

    fn load_model(dir: &TempDir) -> dmdgen::core::model::Model {
        let path: PathBuf = dir.path().join("design.xml");
        fs::write(&path, DESIGN).unwrap();
        ModelLoader::new().load(&[path]).unwrap()
    }

    /// 読み込んだモデルはJSON往復で等しいモデルに戻る
    #[test]
    fn test_round_trip_loaded_model() {
        let temp_dir = TempDir::new().unwrap();
        let model = load_model(&temp_dir);
        let serializer = ModelSerializer::new();

        let json = serializer.serialize_to_string(&model).unwrap();
        let restored = serializer.deserialize_from_str(&json).unwrap();

        assert_eq!(restored, model);
        assert_eq!(serializer.serialize_to_string(&restored).unwrap(), json);
    }

    /// JSON構造の主要フィールド
    #[test]
    fn test_json_shape() {
        let temp_dir = TempDir::new().unwrap();
        let model = load_model(&temp_dir);

        let json = ModelSerializer::new().serialize_to_string(&model).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let country = &value[0];
        assert_eq!(country["name"], "country");
        assert_eq!(country["schema"], "geo");
        assert_eq!(country["comment"], "ISO countries");
        assert_eq!(country["primary_key"][0], "code");
        assert_eq!(country["columns"][0]["type"], "varchar");
        assert_eq!(country["columns"][0]["length"], 8);
        assert_eq!(country["columns"][1]["comment"], "English short name");
        assert!(country.get("relationships").is_none());

        let city = &value[1];
        let relationships = city["relationships"].as_array().unwrap();
        assert_eq!(relationships.len(), 2);
        assert_eq!(relationships[0]["ordinal"], 0);
        assert_eq!(relationships[0]["name"], "fk_city_country");
        assert_eq!(relationships[0]["parent"], "geo.country");
        assert_eq!(relationships[0]["cardinality"], "1:N");
        assert_eq!(relationships[0]["columns"][0]["child"], "country_code");
        assert_eq!(relationships[1]["cardinality"], "1:1");
    }

    /// 参照先カラムが存在しないJSONは InvalidModel
    #[test]
    fn test_unknown_column_is_invalid_model() {
        let json = r#"[
  {"name": "A", "columns": [{"name": "id", "type": "integer", "nullable": false, "position": 1}]},
  {"name": "B", "columns": [{"name": "a_id", "type": "integer", "nullable": true, "position": 1}],
   "relationships": [{"ordinal": 0, "parent": "A", "columns": [{"child": "a_id", "parent": "missing"}]}]}
]"#;

        let error = ModelSerializer::new().deserialize_from_str(json).unwrap_err();

        assert!(error.is_invalid_model());
        assert!(error.to_string().contains("missing"));
    }
}
