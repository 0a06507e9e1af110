use chrono::{DateTime, Local};
use maud::{html, Markup, PreEscaped, DOCTYPE};

use survival_classifiers::passenger::{PassengerClass, Port, Sex, Title, MAX_RELATIVES};
use survival_classifiers::predictor::Verdict;
use survival_classifiers::PredictionFailure;

use crate::web::form::PassengerForm;

const STYLE: &str = "
body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; color: #222; }
form { display: grid; grid-template-columns: 14rem 1fr; gap: 0.6rem 1rem; align-items: center; }
button { grid-column: 2; padding: 0.5rem; }
.panel { margin-top: 1.5rem; padding: 1rem; border-radius: 5px; }
.success { background-color: #e6f4ea; border: 1px solid #34a853; }
.error { background-color: #fce8e6; border: 1px solid #d93025; }
.muted { color: #666; font-size: 0.85rem; }
";

/// Outcome of the last submission, if any.
pub type Outcome = Result<Verdict, PredictionFailure>;

/// The full page: form (pre-filled with `form`) followed by the result of the
/// last submission.
pub fn form_page(
    title: &str,
    form: &PassengerForm,
    outcome: Option<&Outcome>,
    model_error: Option<&PredictionFailure>,
    now: DateTime<Local>,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                h1 { (title) }
                p { "Fill the passenger details to predict survival chances!" }
                @if let Some(e) = model_error {
                    div class="panel error" {
                        "Model unavailable: " (e.to_string())
                    }
                }
                (passenger_form(form))
                @if let Some(outcome) = outcome {
                    (result_panel(outcome, now))
                }
            }
        }
    }
}

fn passenger_form(form: &PassengerForm) -> Markup {
    html! {
        form method="post" action="/predict" {
            label for="pclass" { "Passenger Class" }
            select id="pclass" name="pclass" {
                @for class in PassengerClass::ALL {
                    @let value = class.number().to_string();
                    option value=(value) selected[form.pclass == value] { (value) }
                }
            }

            label for="sex" { "Gender" }
            select id="sex" name="sex" {
                @for sex in Sex::ALL {
                    option value=(sex.display_name())
                        selected[form.sex.eq_ignore_ascii_case(sex.display_name())] { (sex.display_name()) }
                }
            }

            label for="age" { "Age (Years)" }
            input id="age" name="age" type="number" min="0" max="100" step="1" value=(form.age);

            label for="fare" { "Fare (USD)" }
            input id="fare" name="fare" type="number" min="0" max="600" step="0.01" value=(form.fare);

            label for="sibsp" { "Siblings/Spouses Aboard" }
            input id="sibsp" name="sibsp" type="number" min="0" max=(MAX_RELATIVES.to_string()) step="1" value=(form.sibsp);

            label for="parch" { "Parents/Children Aboard" }
            input id="parch" name="parch" type="number" min="0" max=(MAX_RELATIVES.to_string()) step="1" value=(form.parch);

            label for="embarked" { "Embarkation Port" }
            select id="embarked" name="embarked" {
                @for port in Port::ALL {
                    @let label = port.form_label();
                    option value=(label) selected[form.embarked == label] { (label) }
                }
            }

            label for="title" { "Title (optional)" }
            select id="title" name="title" {
                option value="" selected[form.title.is_empty()] { "Not given" }
                @for t in Title::ALL {
                    option value=(t.as_str()) selected[form.title == t.as_str()] { (t.as_str()) }
                }
            }

            label for="name" { "Name (optional)" }
            input id="name" name="name" type="text" placeholder="Surname, Mr. Given" value=(form.name);

            button type="submit" { "Predict Survival" }
        }
    }
}

fn result_panel(outcome: &Outcome, now: DateTime<Local>) -> Markup {
    html! {
        @match outcome {
            Ok(verdict) => {
                div class=(if verdict.survived { "panel success" } else { "panel error" }) id="verdict" {
                    strong { (verdict.label()) }
                    p { (verdict.message()) }
                    p class="muted" {
                        "Survival probability " (format!("{:.1}%", verdict.probability * 100.0))
                        " · predicted at " (now.format("%Y-%m-%d %H:%M:%S").to_string())
                    }
                }
            }
            Err(e) => {
                div class="panel error" id="prediction-error" {
                    "Error during prediction: " (e.to_string())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(outcome: Option<&Outcome>) -> String {
        form_page("Test", &PassengerForm::default(), outcome, None, Local::now()).into_string()
    }

    #[test]
    fn test_blank_page_has_no_result() {
        let page = render(None);
        assert!(page.contains("Predict Survival"));
        assert!(page.contains("Southampton (S)"));
        assert!(!page.contains("id=\"verdict\""));
    }

    #[test]
    fn test_survived_branch() {
        let outcome: Outcome = Ok(Verdict {
            survived: true,
            probability: 0.91,
        });
        let page = render(Some(&outcome));
        assert!(page.contains("would have survived"));
        assert!(page.contains("91.0%"));
        assert!(page.contains("panel success"));
    }

    #[test]
    fn test_error_branch_escapes_message() {
        let outcome: Outcome = Err(PredictionFailure::invalid("Sex", "got '<script>'"));
        let page = render(Some(&outcome));
        assert!(page.contains("Error during prediction"));
        assert!(!page.contains("<script>"));
    }
}
