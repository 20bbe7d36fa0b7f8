//! Natural-language questions answered with generated SQL
//!
//! Flow: question -> SQL plan (model, temperature 0) -> read-only execution
//! -> grounded summary (model, configured sampling).

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use super::dates::date_hints;
use super::AssistantError;
use crate::llm::{extract_json, ChatMessage, ChatModel, ChatRequest, Sampling};
use crate::model::QueryResult;
use crate::profile::NutritionProfile;
use crate::store::catalog;
use crate::store::MealStore;

/// Row cap for generated queries
pub const MAX_ROWS: usize = 200;

/// Rows shown to the model when summarizing
const PREVIEW_ROWS: usize = 20;

const FAILURE_MESSAGE: &str =
    "I ran into an issue while analyzing your data. Please try rephrasing the request.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlPlan {
    pub sql: String,
    pub reasoning: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssistantResponse {
    pub message: String,
    pub sql: Option<String>,
    pub result: Option<QueryResult>,
    pub reasoning: Option<String>,
    pub confidence: Option<f64>,
    pub error: Option<String>,
}

impl AssistantResponse {
    fn failure(error: &AssistantError) -> Self {
        Self {
            message: FAILURE_MESSAGE.to_string(),
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

pub struct SqlAssistant<'a, M> {
    model: &'a M,
    store: &'a MealStore,
    profile: &'a NutritionProfile,
    sampling: Sampling,
    max_rows: usize,
}

impl<'a, M: ChatModel> SqlAssistant<'a, M> {
    pub fn new(model: &'a M, store: &'a MealStore, profile: &'a NutritionProfile) -> Self {
        Self {
            model,
            store,
            profile,
            sampling: Sampling::default(),
            max_rows: MAX_ROWS,
        }
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows.max(1);
        self
    }

    /// Answer a question about the meal log. Failures come back as a
    /// response carrying the error text rather than as `Err`.
    pub async fn answer(&self, question: &str, today: NaiveDate) -> AssistantResponse {
        match self.try_answer(question, today).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(question, "analytics request failed: {}", e);
                AssistantResponse::failure(&e)
            }
        }
    }

    async fn try_answer(
        &self,
        question: &str,
        today: NaiveDate,
    ) -> Result<AssistantResponse, AssistantError> {
        let plan = self.generate_plan(question, today).await?;
        tracing::info!(sql = %plan.sql, confidence = plan.confidence, "generated SQL");

        let result = self
            .store
            .run_read_only(&plan.sql, self.max_rows)
            .map_err(|e| AssistantError::SqlExecution(format!("database error: {:#}", e)))?;

        let message = self.summarize(question, &plan, &result).await?;
        Ok(AssistantResponse {
            message,
            sql: Some(plan.sql),
            result: Some(result),
            reasoning: Some(plan.reasoning),
            confidence: Some(plan.confidence),
            error: None,
        })
    }

    pub async fn generate_plan(
        &self,
        question: &str,
        today: NaiveDate,
    ) -> Result<SqlPlan, AssistantError> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(self.plan_prompt(question, today)),
            ChatMessage::user(question.trim()),
        ])
        .temperature(0.0)
        .max_tokens(600)
        .top_p(1.0);

        let reply = self.model.complete(&request).await.map_err(|e| {
            AssistantError::SqlGeneration(format!("model error while generating SQL: {}", e))
        })?;
        let data = extract_json(&reply).map_err(|_| {
            AssistantError::SqlGeneration("unable to parse SQL plan JSON".to_string())
        })?;

        let sql = data
            .get("sql")
            .and_then(Value::as_str)
            .map(|s| s.trim().trim_end_matches(';').trim())
            .unwrap_or_default()
            .to_string();
        if sql.is_empty() {
            return Err(AssistantError::SqlGeneration(
                "the assistant did not return SQL".to_string(),
            ));
        }
        if !is_select_query(&sql) {
            return Err(AssistantError::SqlGeneration(
                "only read-only SELECT/WITH queries are allowed".to_string(),
            ));
        }

        let reasoning = ["reasoning", "analysis"]
            .iter()
            .find_map(|key| data.get(*key).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();

        let confidence = data
            .get("confidence")
            .and_then(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .filter(|c| c.is_finite())
            .unwrap_or(0.5)
            .clamp(0.0, 1.0);

        Ok(SqlPlan {
            sql,
            reasoning,
            confidence,
        })
    }

    async fn summarize(
        &self,
        question: &str,
        plan: &SqlPlan,
        result: &QueryResult,
    ) -> Result<String, AssistantError> {
        let system = format!(
            "{}\nAlways base your answers strictly on the data provided. \
             If there is no relevant data, say so instead of guessing.",
            self.profile.system_prompt
        );

        let preview: Vec<_> = result.records().into_iter().take(PREVIEW_ROWS).collect();
        let preview = serde_json::to_string_pretty(&preview).unwrap_or_else(|_| "[]".to_string());
        let user = format!(
            "Question: {}\n\
             SQL Query: {}\n\
             SQL reasoning: {}\n\
             Row count: {}{}\n\
             Result sample (JSON):\n{}\n\n\
             Nutrition profile (YAML):\n{}\n\
             Write a concise, encouraging answer. Reference concrete numbers when possible.",
            question.trim(),
            plan.sql,
            plan.reasoning,
            result.rows.len(),
            if result.truncated { " (truncated)" } else { "" },
            preview,
            self.profile.to_yaml(),
        );

        let request = ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .sampling(self.sampling);
        self.model.complete(&request).await.map_err(|e| {
            AssistantError::SqlExecution(format!("model error while summarizing answer: {}", e))
        })
    }

    fn plan_prompt(&self, question: &str, today: NaiveDate) -> String {
        let mut dates = format!("Today's date is {}.\n", today.format("%Y-%m-%d"));
        let hints = date_hints(question, today);
        if !hints.is_empty() {
            dates.push_str("Date references in the question (inclusive ranges):\n");
            for (phrase, range) in hints {
                dates.push_str(&format!(
                    "- \"{}\": date >= '{}' AND date <= '{}'\n",
                    phrase,
                    range.start_iso(),
                    range.end_iso()
                ));
            }
        }

        format!(
            "You are an elite SQLite analyst for a vegan nutrition tracker.\n\
             Follow the rules:\n\
             1. Only output JSON with keys sql, reasoning, confidence.\n\
             2. SQL must be a single SELECT or WITH statement compatible with SQLite.\n\
             3. Never modify data (no INSERT/UPDATE/DELETE).\n\
             4. Use meaningful column aliases for aggregates.\n\
             5. Dates are TEXT in YYYY-MM-DD format; compare them as strings.\n\
             {}\n\
             {}\
             Nutrition profile and system prompt (YAML):\n{}\n\
             Example query patterns:\n{}\n\
             Respond with JSON only.",
            catalog::schema_context(),
            dates,
            self.profile.to_yaml(),
            catalog::example_queries(),
        )
    }
}

/// Whether `sql` starts with SELECT or WITH (case-insensitive)
pub fn is_select_query(sql: &str) -> bool {
    let keyword: String = sql
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_lowercase();
    keyword == "select" || keyword == "with"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;
    use crate::model::NewMeal;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 12).unwrap()
    }

    fn store() -> MealStore {
        let store = MealStore::open_in_memory().unwrap();
        for (date, name, protein) in [
            ("2024-12-03", "Tofu bowl", 30.0),
            ("2024-12-05", "Lentil curry", 22.0),
            ("2024-12-11", "Seitan wrap", 40.0),
        ] {
            let mut meal = NewMeal {
                date: Some(date.to_string()),
                time: Some("12:00:00".to_string()),
                meal_type: Some("Lunch".to_string()),
                meal_name: Some(name.to_string()),
                ..NewMeal::default()
            };
            meal.nutrients.protein = Some(protein);
            store.insert_meal(&meal).unwrap();
        }
        store
    }

    #[test]
    fn test_is_select_query() {
        assert!(is_select_query("SELECT 1"));
        assert!(is_select_query("  with t as (select 1) select * from t"));
        assert!(!is_select_query("DELETE FROM meals"));
        assert!(!is_select_query("selection"));
        assert!(!is_select_query(""));
    }

    #[tokio::test]
    async fn test_answer_runs_generated_sql() {
        let store = store();
        let profile = NutritionProfile::default();
        let model = ScriptedModel::new([
            r#"{"sql": "SELECT SUM(protein) AS total_protein_g FROM meals WHERE date >= '2024-12-02' AND date <= '2024-12-08';",
                "reasoning": "Sum protein over last week", "confidence": 0.9}"#,
            "You ate 52 g of protein last week.",
        ]);

        let assistant = SqlAssistant::new(&model, &store, &profile);
        let response = assistant
            .answer("How much protein did I eat last week?", today())
            .await;

        assert!(response.error.is_none(), "{:?}", response.error);
        assert_eq!(response.message, "You ate 52 g of protein last week.");
        assert_eq!(response.confidence, Some(0.9));
        let result = response.result.unwrap();
        assert_eq!(result.columns, vec!["total_protein_g"]);
        assert_eq!(result.rows, vec![vec![serde_json::json!(52.0)]]);

        let requests = model.requests();
        let plan_prompt = &requests[0].messages[0].content;
        assert!(plan_prompt.contains("Today's date is 2024-12-12."));
        assert!(plan_prompt.contains("\"last week\": date >= '2024-12-02' AND date <= '2024-12-08'"));
        assert_eq!(requests[0].temperature, 0.0);

        let summary_prompt = &requests[1].messages[1].content;
        assert!(summary_prompt.contains("Row count: 1"));
        assert!(requests[1].messages[0]
            .content
            .starts_with("You are a careful vegan nutrition analyst."));
    }

    #[tokio::test]
    async fn test_rejects_write_statements() {
        let store = store();
        let profile = NutritionProfile::default();
        let model = ScriptedModel::new([r#"{"sql": "DELETE FROM meals", "confidence": 1}"#]);

        let response = SqlAssistant::new(&model, &store, &profile)
            .answer("delete everything", today())
            .await;

        assert!(response.error.is_some());
        assert_eq!(response.message, FAILURE_MESSAGE);
        assert!(response.error.unwrap().contains("SELECT/WITH"));
        assert_eq!(store.list_meals(0, 10).unwrap().len(), 3);
        // No summary call after a failed plan
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_execution_error_is_reported() {
        let store = store();
        let profile = NutritionProfile::default();
        let model = ScriptedModel::new([r#"{"sql": "SELECT sodium FROM meals"}"#]);

        let response = SqlAssistant::new(&model, &store, &profile)
            .answer("sodium?", today())
            .await;
        assert!(response.error.unwrap().starts_with("could not run SQL: database error"));
    }

    #[tokio::test]
    async fn test_plan_defaults_and_clamping() {
        let store = store();
        let profile = NutritionProfile::default();
        let model = ScriptedModel::new([
            r#"{"sql": "SELECT 1", "analysis": "trivial"}"#,
            r#"{"sql": "SELECT 1", "confidence": 7}"#,
            r#"{"reasoning": "forgot the sql"}"#,
        ]);
        let assistant = SqlAssistant::new(&model, &store, &profile);

        let plan = assistant.generate_plan("q", today()).await.unwrap();
        assert_eq!(plan.confidence, 0.5);
        assert_eq!(plan.reasoning, "trivial");

        let plan = assistant.generate_plan("q", today()).await.unwrap();
        assert_eq!(plan.confidence, 1.0);

        let err = assistant.generate_plan("q", today()).await.unwrap_err();
        assert!(matches!(err, AssistantError::SqlGeneration(_)));
    }

    #[tokio::test]
    async fn test_row_cap() {
        let store = store();
        let profile = NutritionProfile::default();
        let model = ScriptedModel::new([r#"{"sql": "SELECT meal_name FROM meals ORDER BY id"}"#, "ok"]);

        let response = SqlAssistant::new(&model, &store, &profile)
            .with_max_rows(2)
            .answer("names", today())
            .await;
        let result = response.result.unwrap();
        assert_eq!(result.rows.len(), 2);
        assert!(result.truncated);
        assert!(model.requests()[1].messages[1].content.contains("Row count: 2 (truncated)"));
    }
}
