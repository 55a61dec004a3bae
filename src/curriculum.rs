//! Built-in curriculum: activities, expected-answer keywords and model solutions.
//!
//! Keyword and solution tables can be extended or overridden from the TOML config
//! (`[curriculum]`), so content changes never touch the analyzer or the session.

use std::collections::HashMap;

use tracing::warn;

use crate::config::CurriculumCfg;
use crate::domain::{Exercise, ExerciseItem, ExerciseItems, FieldId};

pub const NO_FEEDBACK_YET: &str = "Sin feedback aún. Pulsa 'Revisar mi respuesta' para obtener análisis.";

/// Static content consumed by the session. Immutable after construction.
#[derive(Clone, Debug)]
pub struct Curriculum {
  pub exercises: Vec<Exercise>,
  /// Lowercase keywords per field id; a field without an entry gets grammar feedback only.
  pub expected: HashMap<String, Vec<String>>,
  pub solutions: HashMap<String, String>,
}

impl Default for Curriculum {
  fn default() -> Self {
    Self { exercises: builtin_exercises(), expected: builtin_expected(), solutions: builtin_solutions() }
  }
}

impl Curriculum {
  /// Built-in content with config overrides applied. Entries for unknown fields are dropped.
  pub fn with_overrides(cfg: &CurriculumCfg) -> Self {
    let mut c = Self::default();
    for (field, keywords) in &cfg.expected {
      if c.check_override_key(field, "expected") {
        c.expected.insert(field.clone(), keywords.iter().map(|k| k.to_lowercase()).collect());
      }
    }
    for (field, solution) in &cfg.solutions {
      if c.check_override_key(field, "solutions") {
        c.solutions.insert(field.clone(), solution.clone());
      }
    }
    c
  }

  fn check_override_key(&self, field: &str, table: &str) -> bool {
    let known = field.parse::<FieldId>().map(|f| self.has_field(&f)).unwrap_or(false);
    if !known {
      warn!(target: "lesson", %field, %table, "Ignoring curriculum override for unknown field");
    }
    known
  }

  pub fn exercise(&self, id: &str) -> Option<&Exercise> {
    self.exercises.iter().find(|e| e.id == id)
  }

  pub fn has_field(&self, field: &FieldId) -> bool {
    self.exercise(&field.exercise).is_some_and(|e| e.owns(field))
  }

  pub fn solution(&self, field: &FieldId) -> Option<&str> {
    self.solutions.get(&field.to_string()).map(String::as_str)
  }

  pub fn hint(&self, field: &FieldId) -> Option<&str> {
    self.exercise(&field.exercise)
      .and_then(|e| e.item(field))
      .and_then(|i| i.hint.as_deref())
  }

  pub fn total(&self) -> usize {
    self.exercises.len()
  }
}

fn item(prompt: &str, hint: &str) -> ExerciseItem {
  ExerciseItem { prompt: prompt.into(), hint: Some(hint.into()) }
}

fn builtin_exercises() -> Vec<Exercise> {
  vec![
    Exercise {
      id: "act1".into(),
      title: "Actividad 1: Comprensión del Chat".into(),
      difficulty: "Básico".into(),
      items: ExerciseItems::Questions(vec![
        item("1. Woher kommt Sebastian?", "Busca en el chat cuando Sebastian habla de su origen. ¿Qué ciudad menciona?"),
        item("2. Welche Nationalität haben Annas Eltern?", "Anna habla de sus padres. ¿Qué dice sobre \"Mein Vater\" y \"Meine Mutter\"?"),
        item("3. Was ist Annas Hobby?", "Anna menciona qué le gusta hacer. Busca la palabra \"Hobby\" o verbos de actividades."),
        item("4. Wie viele Tiere hat Sebastian?", "Sebastian habla de sus mascotas (Haustiere). Cuenta cuántas menciona."),
        item("5. Wie heißen Annas Katzen?", "Anna menciona los nombres de sus gatos. Son dos nombres."),
        item("6. Warum beendet Sebastian den Chat?", "Al final del chat, Sebastian explica por qué tiene que irse."),
      ]),
    },
    Exercise {
      id: "act2".into(),
      title: "Actividad 2: Caza de Pronombres y Verbos".into(),
      difficulty: "Intermedio".into(),
      items: ExerciseItems::Tasks(vec![
        item(
          "Subraya todos los pronombres personales. ¿Cuántos pronombres diferentes encontraste en el chat?",
          "En alemán son: ich (yo), du (tú), er/sie/es (él/ella/eso), wir (nosotros), ihr (vosotros), sie/Sie (ellos/usted)",
        ),
        item(
          "Marca los verbos conjugados. ¿Qué verbo sigue después de cada pronombre?",
          "Los verbos son palabras de acción o estado. Busca palabras que indican lo que alguien hace o es.",
        ),
      ]),
    },
    Exercise {
      id: "act3".into(),
      title: "Actividad 3: Tablas de Conjugación".into(),
      difficulty: "Intermedio-Avanzado".into(),
      items: ExerciseItems::Verbs(vec![
        item("kommen (regular)", "Raíz: komm- → añade las terminaciones: -e, -st, -t, -en, -t, -en"),
        item("wohnen (regular)", "Raíz: wohn- → mismo patrón que \"kommen\""),
        item("sein (irregular)", "¡ALERTA! Este verbo es irregular. Debes memorizar: bin, bist, ist, sind, seid, sind"),
        item("haben (irregular)", "¡ALERTA! Irregular: habe, hast, hat, haben, habt, haben"),
      ]),
    },
    Exercise {
      id: "act4".into(),
      title: "Actividad 4: Completar el Diálogo".into(),
      difficulty: "Avanzado".into(),
      items: ExerciseItems::FreeText,
    },
    Exercise {
      id: "act5".into(),
      title: "Actividad 5: Perfil de Leonard".into(),
      difficulty: "Producción".into(),
      items: ExerciseItems::FreeText,
    },
    Exercise {
      id: "act6".into(),
      title: "Actividad 6: ¡Tu Presentación Personal!".into(),
      difficulty: "Creación Personal".into(),
      items: ExerciseItems::FreeText,
    },
  ]
}

fn builtin_expected() -> HashMap<String, Vec<String>> {
  let table: [(&str, &[&str]); 6] = [
    ("act1_q0", &["münchen", "aus münchen", "muenchen"]),
    ("act1_q1", &["österreicher", "österreich", "deutsche", "deutsch"]),
    ("act1_q2", &["fotografieren", "fotografie", "fotografin", "fotograf"]),
    ("act1_q3", &["hund", "einen hund", "1"]),
    ("act1_q4", &["twix", "tiramisu"]),
    ("act1_q5", &["training", "fußball", "fussball"]),
  ];
  table
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
    .collect()
}

fn builtin_solutions() -> HashMap<String, String> {
  HashMap::from([
    ("act1_q0".into(), "Sebastian kommt aus München.".into()),
    ("act1_q1".into(), "Annas Vater ist Österreicher und ihre Mutter ist Deutsche.".into()),
    ("act1_q2".into(), "Annas Hobby ist Fotografieren.".into()),
    ("act1_q3".into(), "Er hat einen Hund.".into()),
    ("act1_q4".into(), "Die Katzen heißen Twix und Tiramisu.".into()),
    ("act1_q5".into(), "Er muss gehen, weil er Training hat.".into()),
    (
      "act4".into(),
      "Lena: Hallo! Wie heißt du?\n\
       Max: Ich heiße Max. Und du?\n\
       Lena: Ich heiße Lena. Woher kommst du?\n\
       Max: Ich komme aus Berlin. Und du?\n\
       Lena: Ich komme aus München. Wo wohnst du?\n\
       Max: Ich wohne in Berlin. Und was machst du?\n\
       Lena: Ich bin Studentin. Und du?\n\
       Max: Ich bin auch Student."
        .into(),
    ),
  ])
}
