// SQL生成アダプター
//
// 凍結済みモデルから方言ごとのDDL文を生成するアダプター層。
// 全テーブルの CREATE TABLE を先に出力し、外部キーは ALTER TABLE で後から追加します。
// これにより循環する外部キーがあってもトポロジカルソートは不要です。

pub mod template;

pub use template::TemplateSqlGenerator;

use crate::adapters::type_mapping::TypeMapping;
use crate::core::error::ConvertResult;
use crate::core::model::{Model, Relationship, Table};
use tracing::debug;

/// SQLジェネレータートレイト
///
/// 文単位のSQL生成を行うインターフェース。
pub trait SqlGenerator {
    /// CREATE TABLE文を生成
    ///
    /// # Arguments
    ///
    /// * `table` - テーブル定義
    ///
    /// # Returns
    ///
    /// `;` で終わるCREATE TABLE文
    fn generate_create_table(&self, table: &Table) -> ConvertResult<String>;

    /// 外部キー追加のALTER TABLE文を生成
    ///
    /// # Arguments
    ///
    /// * `model` - リレーションシップが参照するテーブルを含むモデル
    /// * `relationship` - リレーションシップ
    ///
    /// # Returns
    ///
    /// `;` で終わるALTER TABLE文
    fn generate_add_foreign_key(&self, model: &Model, relationship: &Relationship) -> String;
}

/// DDLジェネレーター
///
/// 出力は (Model, TypeMapping) の純粋関数であり、同じ入力からは常に同じ文の列を返します。
#[derive(Debug, Clone)]
pub struct DdlGenerator<G> {
    generator: G,
}

impl<'a> DdlGenerator<TemplateSqlGenerator<'a>> {
    /// 型マッピングを使用するDDLジェネレーターを作成
    pub fn new(mapping: &'a TypeMapping) -> Self {
        Self::with_generator(TemplateSqlGenerator::new(mapping))
    }
}

impl<G: SqlGenerator> DdlGenerator<G> {
    /// 任意の文ジェネレーターでDDLジェネレーターを作成
    pub fn with_generator(generator: G) -> Self {
        Self { generator }
    }

    /// DDL文の列を生成
    ///
    /// フェーズ1ですべてのCREATE TABLE文をモデル順に、
    /// フェーズ2ですべての外部キー追加文を宣言順に出力します。
    ///
    /// # Errors
    ///
    /// 論理型にマッピングがないカラムがある場合は UnresolvedTypeMapping を返し、
    /// 部分的なDDLは返しません。
    pub fn generate(&self, model: &Model) -> ConvertResult<Vec<String>> {
        let mut statements = Vec::with_capacity(model.table_count() + model.relationship_count());

        for table in model.tables() {
            statements.push(self.generator.generate_create_table(table)?);
        }

        for relationship in model.relationships() {
            statements.push(self.generator.generate_add_foreign_key(model, relationship));
        }

        debug!(statements = statements.len(), "Generated DDL statements");

        Ok(statements)
    }

    /// DDLスクリプト（1行1文、末尾改行付き）を生成
    pub fn generate_script(&self, model: &Model) -> ConvertResult<String> {
        let statements = self.generate(model)?;
        let mut script = statements.join("\n");
        if !script.is_empty() {
            script.push('\n');
        }
        Ok(script)
    }
}
