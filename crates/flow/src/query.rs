use tutorflow_enrollment::Step;

/// Route that resolves the payment outcome after the gateway return trip.
///
/// The flow never resumes step 3 on return; outcome determination belongs
/// entirely to this collaborator.
pub const PAYMENT_STATUS_ROUTE: &str = "/enrollment/payment-status";

/// Query parameters the flow consumes on mount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    /// `step` - overrides the restored wizard step (deep links).
    pub step: Option<u8>,
    /// Gateway correlation parameters, present only on the return trip.
    pub reference: Option<String>,
    pub trxref: Option<String>,
}

impl QueryParams {
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key {
                "step" => params.step = value.parse().ok(),
                "reference" => params.reference = Some(value.to_string()),
                "trxref" => params.trxref = Some(value.to_string()),
                _ => {}
            }
        }
        params
    }

    /// Step requested in the URL, when it names a real step.
    pub fn step_override(&self) -> Option<Step> {
        self.step.and_then(Step::from_number)
    }

    /// Whether this load is the return trip from the payment gateway.
    pub fn is_payment_return(&self) -> bool {
        self.reference.is_some() || self.trxref.is_some()
    }
}
