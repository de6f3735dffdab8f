// src/panel/arrow.rs

use arrow::{
    array::{ArrayRef, Float64Array, Int32Array, StringArray, UInt8Array},
    datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use super::{ModelFrame, Panel};
use crate::error::Result;
use crate::schema::{
    ANO, IGC, INTERACAO, LN_IGC, LN_ORCAMENTO, LN_ORCAMENTO_LAG, ORCAMENTO, ORCAMENTO_MILHOES,
    POS_TETO, UNIVERSIDADE,
};

/// Extra column recording how an IGC value was filled.
pub const IGC_IMPUTED: &str = "IGC_imputado";

/// Arrow layout of an exported panel:
/// - `Universidade` → Utf8
/// - `Ano`          → Int32
/// - `Pos_Teto`     → UInt8
/// - measures       → Float64, nullable (null = undefined)
pub fn panel_schema() -> Arc<ArrowSchema> {
    let float = |name: &str| ArrowField::new(name, DataType::Float64, true);
    Arc::new(ArrowSchema::new(vec![
        ArrowField::new(UNIVERSIDADE, DataType::Utf8, false),
        ArrowField::new(ANO, DataType::Int32, false),
        float(ORCAMENTO),
        float(IGC),
        ArrowField::new(IGC_IMPUTED, DataType::Utf8, true),
        float(ORCAMENTO_MILHOES),
        float(LN_ORCAMENTO),
        float(LN_IGC),
        ArrowField::new(POS_TETO, DataType::UInt8, false),
        float(LN_ORCAMENTO_LAG),
        float(INTERACAO),
    ]))
}

impl Panel {
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let recs = self.records();
        let floats = |f: fn(&super::PanelRecord) -> Option<f64>| -> ArrayRef {
            Arc::new(recs.iter().map(f).collect::<Float64Array>())
        };

        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                recs.iter().map(|r| r.universidade.as_str()),
            )),
            Arc::new(Int32Array::from_iter_values(recs.iter().map(|r| r.ano))),
            floats(|r| r.orcamento),
            floats(|r| r.igc),
            Arc::new(
                recs.iter()
                    .map(|r| {
                        r.igc_imputed.map(|i| match i {
                            super::Imputation::Interpolated => "interpolated",
                            super::Imputation::Carried => "carried",
                        })
                    })
                    .collect::<StringArray>(),
            ),
            floats(|r| r.orcamento_milhoes),
            floats(|r| r.ln_orcamento),
            floats(|r| r.ln_igc),
            Arc::new(UInt8Array::from_iter_values(recs.iter().map(|r| r.pos_teto))),
            floats(|r| r.ln_orcamento_lag),
            floats(|r| r.interacao),
        ];

        Ok(RecordBatch::try_new(panel_schema(), columns)?)
    }
}

impl ModelFrame {
    /// `Universidade`, `Ano`, the dependent variable, then one column per regressor.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields = vec![
            ArrowField::new(UNIVERSIDADE, DataType::Utf8, false),
            ArrowField::new(ANO, DataType::Int32, false),
            ArrowField::new(self.dependent(), DataType::Float64, false),
        ];
        fields.extend(
            self.regressors()
                .iter()
                .map(|name| ArrowField::new(*name, DataType::Float64, false)),
        );

        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                self.rows.iter().map(|r| r.entity.as_str()),
            )),
            Arc::new(Int32Array::from_iter_values(self.rows.iter().map(|r| r.year))),
            Arc::new(Float64Array::from_iter_values(self.rows.iter().map(|r| r.y))),
        ];
        for k in 0..self.regressors().len() {
            columns.push(Arc::new(Float64Array::from_iter_values(
                self.rows.iter().map(|r| r.x[k]),
            )));
        }

        Ok(RecordBatch::try_new(
            Arc::new(ArrowSchema::new(fields)),
            columns,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::{ModelSpec, PanelBuilder};
    use arrow::array::Array;

    const CSV: &str = "Universidade,Ano,Orcamento,IGC\nA,2016,1000000,2\nA,2017,-5,\nB,2018,3000000,4\n";

    #[test]
    fn test_panel_batch_layout() {
        let panel = PanelBuilder::default().build("t.csv", CSV.as_bytes()).unwrap();
        let batch = panel.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), panel_schema().fields().len());

        let ln = batch
            .column_by_name(LN_ORCAMENTO)
            .unwrap()
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert!(ln.is_valid(0));
        assert!(ln.is_null(1), "negative budget must export as null, not a number");

        let imputed = batch
            .column_by_name(IGC_IMPUTED)
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(imputed.value(1), "carried");
        assert!(imputed.is_null(0));
    }

    #[test]
    fn test_frame_batch_columns() {
        let panel = PanelBuilder::default().build("t.csv", CSV.as_bytes()).unwrap();
        let batch = panel
            .model_frame(ModelSpec::DifferenceInDifferences)
            .to_record_batch()
            .unwrap();
        let names: Vec<&str> = batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect();
        assert_eq!(
            names,
            vec!["Universidade", "Ano", "ln_IGC", "ln_Orcamento", "Pos_Teto", "Interacao"]
        );
        assert_eq!(batch.num_rows(), 2);
    }
}
