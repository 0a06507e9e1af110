use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::config::ModelConfig;
use crate::encoding::{FeatureSchema, LabelEncoders};
use crate::error::Result;
use crate::passenger::{PassengerRequest, Port, Sex, Title};

/// Maps a [`PassengerRequest`] onto the column layout of a [`FeatureSchema`].
#[derive(Clone, Debug)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
    labels: LabelEncoders,
}

impl FeatureEncoder {
    pub fn new(schema: FeatureSchema, labels: LabelEncoders) -> Self {
        Self { schema, labels }
    }

    pub fn one_hot() -> Self {
        Self::new(FeatureSchema::OneHot, LabelEncoders::default())
    }

    /// Build the encoder a model configuration asks for, loading its label
    /// encoder table when one is configured.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let labels = match (&config.label_encoders, config.schema) {
            (Some(path), FeatureSchema::LabelEncoded) => LabelEncoders::load(path)?,
            (Some(path), FeatureSchema::OneHot) => {
                log::warn!(
                    "Ignoring label encoders {}: the one_hot schema does not use them",
                    path.display()
                );
                LabelEncoders::default()
            }
            (None, _) => LabelEncoders::default(),
        };
        Ok(Self::new(config.schema, labels))
    }

    pub fn schema(&self) -> FeatureSchema {
        self.schema
    }

    pub fn columns(&self) -> &'static [&'static str] {
        self.schema.columns()
    }

    pub fn width(&self) -> usize {
        self.schema.width()
    }

    pub fn encode(&self, request: &PassengerRequest) -> Array1<f32> {
        let mut row = Array1::zeros(self.width());
        if let Some(slice) = row.as_slice_mut() {
            self.write_row(request, slice);
        }
        row
    }

    /// Encode many requests into one row-major matrix, one row per request.
    pub fn encode_batch(&self, requests: &[PassengerRequest]) -> Array2<f32> {
        let width = self.width();
        let mut data = vec![0.0f32; requests.len() * width];
        data.par_chunks_mut(width)
            .zip(requests.par_iter())
            .for_each(|(row, request)| self.write_row(request, row));
        Array2::from_shape_vec((requests.len(), width), data)
            .expect("encode_batch: buffer sized from schema width")
    }

    fn write_row(&self, request: &PassengerRequest, row: &mut [f32]) {
        debug_assert_eq!(row.len(), self.width());
        row.fill(0.0);
        row[0] = request.pclass().number() as f32;
        row[2] = request.age();
        row[3] = request.fare();

        match self.schema {
            FeatureSchema::OneHot => {
                row[1] = match request.sex() {
                    Sex::Female => 0.0,
                    Sex::Male => 1.0,
                };
                row[4] = request.family_size() as f32;
                row[5 + port_index(request.embarked())] = 1.0;
                if let Some(title) = request.title() {
                    row[8 + title_index(title)] = 1.0;
                }
            }
            FeatureSchema::LabelEncoded => {
                row[1] = self.labels.sex_code(request.sex());
                row[4] = request.sibsp() as f32;
                row[5] = request.parch() as f32;
                row[6] = self.labels.embarked_code(request.embarked());
            }
        }
    }
}

/// `Embarked_1..3` follow the C = 1, Q = 2, S = 3 coding.
fn port_index(port: Port) -> usize {
    match port {
        Port::Cherbourg => 0,
        Port::Queenstown => 1,
        Port::Southampton => 2,
    }
}

/// `Title_1..5` follow the Mr = 1, Miss = 2, Mrs = 3, Master = 4, Other = 5 coding.
fn title_index(title: Title) -> usize {
    match title {
        Title::Mr => 0,
        Title::Miss => 1,
        Title::Mrs => 2,
        Title::Master => 3,
        Title::Other => 4,
    }
}
