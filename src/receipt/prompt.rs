//! The instructions sent to the AI along with a receipt photo.

use std::fmt::Write;

use crate::category::Category;

/// Build the prompt asking for the receipt's store, date and line items as JSON.
///
/// The categories are listed by ID so that the reply refers to them the same way the database
/// does. Items the AI cannot place go in the first category.
pub fn build_prompt(categories: &[Category]) -> String {
    let mut prompt = String::from(
        "このレシート画像を解析して、明細ごとのリストを以下のJSON形式で返してください。\n\
         店名と日付は全体で共通です。\n",
    );

    let choices = categories
        .iter()
        .map(|category| format!("{}({})", category.id, category.name))
        .collect::<Vec<_>>()
        .join(", ");
    let (first_id, second_id) = match categories {
        [first, second, ..] => (first.id, second.id),
        [first] => (first.id, first.id),
        [] => (1, 1),
    };

    // Writing to a String cannot fail.
    let _ = write!(
        prompt,
        "カテゴリ(category)は、品名から推測して以下のIDのいずれかを数値で割り当ててください: {choices}。\
         わからない場合は{first_id}にしてください。\n\
         \n\
         ```json\n\
         {{\n  \
           \"store\": \"店名\",\n  \
           \"date\": \"YYYY-MM-DD\",\n  \
           \"items\": [\n    \
             {{ \"name\": \"商品A\", \"price\": 100, \"category\": {first_id} }},\n    \
             {{ \"name\": \"商品B\", \"price\": 200, \"category\": {second_id} }}\n  \
           ]\n\
         }}\n\
         ```\n\
         余計な説明は不要です。"
    );

    prompt
}
